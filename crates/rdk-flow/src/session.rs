//! Logged-in user context.
//!
//! One [`SessionContext`] is created at startup, initialized once from its
//! store, and passed by reference to whatever needs the current user. Every
//! change is written through to the store immediately.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rdk_schemas::{AccountType, SessionUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Io(String),
    Corrupt(String),
    NotLoggedIn,
    /// The logged-in account lacks the role an operation needs.
    WrongRole {
        required: AccountType,
        actual: AccountType,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(m) => write!(f, "session store error: {m}"),
            SessionError::Corrupt(m) => write!(f, "session file is corrupt: {m}"),
            SessionError::NotLoggedIn => write!(f, "Not logged in. Run `rdk login` first."),
            SessionError::WrongRole { required, actual } => {
                let article = if *required == AccountType::Tenant { "a" } else { "an" };
                write!(
                    f,
                    "This action requires {article} {required} account (logged in as {actual})"
                )
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// What survives between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    /// E-mail awaiting account verification after signup or a refused login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
    /// Backend session cookie header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

pub trait SessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError>;
    fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// JSON file store. A missing file is an empty session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Io(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SessionError::Io(format!("create {}: {e}", parent.display())))?;
        }
        let body = serde_json::to_string_pretty(session)
            .map_err(|e| SessionError::Io(format!("encode session: {e}")))?;
        write_private(&self.path, body.as_bytes())
            .map_err(|e| SessionError::Io(format!("write {}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Io(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

// The file holds the session cookie: owner-only from creation, and an
// existing file is narrowed before the new contents land.
#[cfg(unix)]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(body)
}

#[cfg(not(unix))]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    fs::write(path, body)
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<PersistedSession>>, SessionError> {
        self.inner
            .lock()
            .map_err(|_| SessionError::Io("memory session store poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        *self.slot()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot()? = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SessionContext<S: SessionStore> {
    store: S,
    session: PersistedSession,
    initialized: bool,
}

impl<S: SessionStore> SessionContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: PersistedSession::default(),
            initialized: false,
        }
    }

    /// Read the persisted session. Later calls are no-ops.
    pub fn init(&mut self) -> Result<(), SessionError> {
        if self.initialized {
            return Ok(());
        }
        self.session = self.store.load()?.unwrap_or_default();
        self.initialized = true;
        debug!(logged_in = self.session.user.is_some(), "session loaded");
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current(&self) -> Option<&SessionUser> {
        self.session.user.as_ref()
    }

    /// Current user, or `NotLoggedIn`.
    pub fn require_user(&self) -> Result<&SessionUser, SessionError> {
        self.current().ok_or(SessionError::NotLoggedIn)
    }

    pub fn require_role(&self, role: AccountType) -> Result<&SessionUser, SessionError> {
        let user = self.require_user()?;
        if user.account_type != role {
            return Err(SessionError::WrongRole {
                required: role,
                actual: user.account_type,
            });
        }
        Ok(user)
    }

    pub fn pending_email(&self) -> Option<&str> {
        self.session.pending_email.as_deref()
    }

    pub fn cookie(&self) -> Option<&str> {
        self.session.cookie.as_deref()
    }

    pub fn login(&mut self, user: SessionUser, cookie: Option<String>) -> Result<(), SessionError> {
        info!(user_id = %user.unique_id, account_type = %user.account_type, "logged in");
        self.session = PersistedSession {
            user: Some(user),
            pending_email: None,
            cookie,
        };
        self.store.save(&self.session)
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(user) = &self.session.user {
            info!(user_id = %user.unique_id, "logged out");
        }
        self.session = PersistedSession::default();
        self.store.clear()
    }

    /// Replace the stored user after a profile change.
    pub fn update(&mut self, user: SessionUser) -> Result<(), SessionError> {
        if self.session.user.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        self.session.user = Some(user);
        self.store.save(&self.session)
    }

    /// Remember `email` as awaiting OTP verification.
    pub fn require_verification(&mut self, email: &str) -> Result<(), SessionError> {
        self.session.user = None;
        self.session.pending_email = Some(email.trim().to_string());
        self.store.save(&self.session)
    }

    pub fn clear_pending_verification(&mut self) -> Result<(), SessionError> {
        if self.session.pending_email.take().is_none() {
            return Ok(());
        }
        self.store.save(&self.session)
    }
}
