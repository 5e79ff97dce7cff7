//! Login credentials for non-interactive CLI use.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `auth.credentials_env`
//!   (e.g. `password: "RDK_LOGIN_PASSWORD"`).
//! - `resolve_credentials` is called once by the CLI when `login` is run
//!   without explicit flags; the result is handed to the login call and
//!   dropped.
//! - `Debug` redacts the password. Errors name the env var, never its value.

use serde_json::Value;

pub const DEFAULT_EMAIL_VAR: &str = "RDK_LOGIN_EMAIL";
pub const DEFAULT_PASSWORD_VAR: &str = "RDK_LOGIN_PASSWORD";

#[derive(Clone)]
pub struct ResolvedCredentials {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Env var name the password was looked up under (for error messages).
    pub password_var: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("password_var", &self.password_var)
            .finish()
    }
}

impl ResolvedCredentials {
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolve login credentials through the env var names configured in
/// `config_json`, falling back to `RDK_LOGIN_EMAIL` / `RDK_LOGIN_PASSWORD`.
/// Blank values count as absent.
pub fn resolve_credentials<F>(config_json: &Value, lookup: F) -> ResolvedCredentials
where
    F: Fn(&str) -> Option<String>,
{
    let email_var = read_str_at(config_json, "/auth/credentials_env/email")
        .unwrap_or_else(|| DEFAULT_EMAIL_VAR.to_string());
    let password_var = read_str_at(config_json, "/auth/credentials_env/password")
        .unwrap_or_else(|| DEFAULT_PASSWORD_VAR.to_string());

    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    ResolvedCredentials {
        email: non_blank(lookup(&email_var)).map(|s| s.trim().to_string()),
        password: non_blank(lookup(&password_var)),
        password_var,
    }
}
