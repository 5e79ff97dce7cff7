//! Command handler modules for rdk-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod account;
pub mod admin;
pub mod dialog;
pub mod finance;
pub mod flats;
pub mod requests;

use std::fs;
use std::future::Future;
use std::io::BufRead;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use rdk_api::{Ack, ApiError, HttpRentalApi};
use rdk_config::{ClientConfig, LoadedConfig, UnusedKeyPolicy};
use rdk_flow::{FileSessionStore, GuardOutcome, InFlightLock, SessionContext};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a command needs: effective config, the facade and the session.
pub struct Ctx {
    pub loaded: LoadedConfig,
    pub config: ClientConfig,
    pub api: HttpRentalApi,
    pub session: SessionContext<FileSessionStore>,
    lock: InFlightLock,
}

impl Ctx {
    pub fn open(config_paths: &[String]) -> Result<Self> {
        let loaded = load_config(config_paths)?;
        let config = loaded
            .client_config()?
            .apply_env_overrides(|k| std::env::var(k).ok())?;

        let mut session = SessionContext::new(FileSessionStore::new(&config.session.path));
        session.init()?;

        let api = HttpRentalApi::new(&config.api.base_url, config.request_timeout())?;
        if let Some(cookie) = session.cookie() {
            api.restore_session_cookie(cookie);
        }

        info!(
            base_url = %config.api.base_url,
            config_hash = %loaded.config_hash,
            "client ready"
        );
        Ok(Self {
            loaded,
            config,
            api,
            session,
            lock: InFlightLock::new(),
        })
    }

    /// Run one mutation under the in-flight lock. Server failures come back
    /// as an `ApiError` inside the anyhow chain so callers can downcast.
    pub async fn submit<T, F, Fut>(&self, action: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.lock.run(action).await {
            GuardOutcome::Completed(v) => Ok(v),
            GuardOutcome::Failed(err) => Err(err.into()),
            GuardOutcome::Busy => bail!("A request is already in progress"),
            GuardOutcome::CoolingDown { remaining_ms } => {
                bail!("Please wait {}s before retrying", secs_ceil(remaining_ms))
            }
        }
    }
}

/// Load layered config. No paths means every key at its default.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        rdk_config::load_layered_yaml(&path_refs)?
    };
    rdk_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    Ok(loaded)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Milliseconds to whole seconds, rounded up.
pub fn secs_ceil(ms: i64) -> i64 {
    (ms.max(0) + 999) / 1000
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the server's message, or `fallback` when it sent none.
pub fn print_ack(ack: &Ack, fallback: &str) {
    println!("{}", ack.message.as_deref().unwrap_or(fallback));
}

pub fn or_dash(v: Option<&str>) -> &str {
    v.filter(|s| !s.is_empty()).unwrap_or("-")
}

/// Read one line (a password or an OTP) from `input`, without the newline.
pub fn read_line<R: BufRead>(mut input: R) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Load a JSON document from either an inline string or a file path.
pub fn load_json_arg(inline: Option<String>, file: Option<String>) -> Result<Value> {
    if let Some(p) = file {
        let bytes = fs::read(&p).with_context(|| format!("read json file failed: {p}"))?;
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
        let raw = String::from_utf8(bytes.to_vec()).context("json file must be UTF-8 text")?;
        return serde_json::from_str(raw.trim()).context("json file must contain valid JSON");
    }

    let raw = inline.context("must provide --json or --json-file")?;
    serde_json::from_str(raw.trim()).context("--json must be valid JSON")
}
