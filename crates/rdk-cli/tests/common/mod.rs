//! Helpers for driving the `rdk` binary against a mock backend.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// Write a session file for an already logged-in user.
    pub fn login_as(&self, unique_id: &str, account_type: &str) {
        let body = serde_json::json!({
            "user": {
                "unique_id": unique_id,
                "username": format!("user-{unique_id}"),
                "account_type": account_type,
            },
            "cookie": "session=abc123",
        });
        fs::write(self.session_path(), body.to_string()).expect("write session");
    }

    pub fn session_json(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.session_path()).expect("read session");
        serde_json::from_str(&raw).expect("session json")
    }

    pub fn write(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write file");
        path.to_string_lossy().to_string()
    }

    /// `rdk` run inside the workspace, pointed at `base_url`, with no
    /// inherited credentials.
    pub fn rdk(&self, base_url: &str) -> Command {
        let mut cmd = Command::cargo_bin("rdk").expect("rdk binary");
        cmd.current_dir(self.dir.path())
            .env("RDK_API_BASE_URL", base_url)
            .env("RDK_SESSION_PATH", self.session_path())
            .env_remove("RDK_LOGIN_EMAIL")
            .env_remove("RDK_LOGIN_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// A base URL nothing listens on.
pub const DEAD_BACKEND: &str = "http://127.0.0.1:1";
