//! rdk-config
//!
//! Layered YAML configuration for the RentDesk client.
//!
//! Documents are merged in order (base -> environment -> local overrides),
//! converted to JSON, checked for secret literals, canonicalized and hashed.
//! The typed [`ClientConfig`] is then extracted from the merged JSON with
//! defaults for every key, and the `RDK_*` environment overrides are applied
//! last.

mod credentials;

pub use credentials::{resolve_credentials, ResolvedCredentials};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::time::Duration;

/// Known secret-like prefixes / patterns. If any leaf string value in the
/// effective config starts with one of these, loading aborts with
/// CONFIG_SECRET_DETECTED. Config stores env var NAMES only.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // Stripe / OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

/// Leaf keys that must never hold a literal value, whatever it looks like.
const FORBIDDEN_LITERAL_KEYS: &[&str] = &["password", "otp_code", "session_cookie"];

/// Leaves under this prefix hold env var names, not values.
const CREDENTIALS_ENV_PREFIX: &str = "/auth/credentials_env/";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_OTP_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_SESSION_PATH: &str = ".rdk/session.json";

pub const ENV_BASE_URL: &str = "RDK_API_BASE_URL";
pub const ENV_SESSION_PATH: &str = "RDK_SESSION_PATH";

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Client-side re-dispatch window after a successful OTP send.
    pub otp_cooldown_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub path: String,
}

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub guard: GuardConfig,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            guard: GuardConfig {
                otp_cooldown_secs: DEFAULT_OTP_COOLDOWN_SECS,
            },
            session: SessionConfig {
                path: DEFAULT_SESSION_PATH.to_string(),
            },
        }
    }
}

impl ClientConfig {
    /// Extract the typed config from merged JSON. Absent keys take defaults;
    /// present keys with the wrong type are errors.
    pub fn from_json(v: &Value) -> Result<Self> {
        let d = ClientConfig::default();
        let cfg = ClientConfig {
            api: ApiConfig {
                base_url: read_string(v, "/api/base_url")?.unwrap_or(d.api.base_url),
                timeout_secs: read_u64(v, "/api/timeout_secs")?.unwrap_or(d.api.timeout_secs),
            },
            guard: GuardConfig {
                otp_cooldown_secs: read_u64(v, "/guard/otp_cooldown_secs")?
                    .unwrap_or(d.guard.otp_cooldown_secs),
            },
            session: SessionConfig {
                path: read_string(v, "/session/path")?.unwrap_or(d.session.path),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `RDK_*` overrides. `lookup` is injected so tests need not touch
    /// the process environment.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_SESSION_PATH).filter(|s| !s.trim().is_empty()) {
            self.session.path = path.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!(
                "CONFIG_INVALID api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            );
        }
        if self.api.timeout_secs == 0 {
            bail!("CONFIG_INVALID api.timeout_secs must be > 0");
        }
        if self.session.path.trim().is_empty() {
            bail!("CONFIG_INVALID session.path must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn otp_cooldown(&self) -> Duration {
        Duration::from_secs(self.guard.otp_cooldown_secs)
    }
}

fn read_string(v: &Value, ptr: &str) -> Result<Option<String>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => bail!("CONFIG_INVALID {} must be a string (got {})", ptr, other),
    }
}

fn read_u64(v: &Value, ptr: &str) -> Result<Option<u64>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(n) => n
            .as_u64()
            .map(Some)
            .with_context(|| format!("CONFIG_INVALID {ptr} must be a non-negative integer")),
    }
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// JSON-pointer prefixes actually read by the client. Any leaf outside
/// these is reported as unused (usually a typo such as `guard/otp_cooldown`).
pub const CONSUMED_POINTERS: &[&str] = &[
    "/api/base_url",
    "/api/timeout_secs",
    "/guard/otp_cooldown_secs",
    "/session/path",
    "/auth/credentials_env/email",
    "/auth/credentials_env/password",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves no code reads. `Warn` logs and returns the report,
/// `Fail` errors when anything is unused.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<&str> = CONSUMED_POINTERS.iter().copied().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed.iter().any(|cp| is_prefix_pointer(cp, lp)))
        // A null document has the single leaf "/".
        .filter(|lp| lp != "/")
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if !report.is_clean() {
        match policy {
            UnusedKeyPolicy::Fail => bail!(
                "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected: {:?}",
                report.unused_leaf_pointers.len(),
                report.unused_leaf_pointers
            ),
            UnusedKeyPolicy::Warn => tracing::warn!(
                unused = ?report.unused_leaf_pointers,
                "config contains keys the client does not read"
            ),
        }
    }

    Ok(report)
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
///
/// "/a/b" consumes "/a/b" and "/a/b/c" but NOT "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Load with no files: every key at its default.
    pub fn empty() -> Result<Self> {
        load_layered_yaml_from_strings(&[])
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        ClientConfig::from_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        if raw.trim().is_empty() {
            continue;
        }
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json's default Map is ordered by key, so this string is canonical.
    let canonical_json =
        serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        let Some(Value::String(s)) = v.pointer(&ptr) else {
            continue;
        };
        let key = ptr.rsplit('/').next().unwrap_or_default();
        let names_env_var = ptr.starts_with(CREDENTIALS_ENV_PREFIX);
        if FORBIDDEN_LITERAL_KEYS.contains(&key) && !names_env_var && !s.trim().is_empty() {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
