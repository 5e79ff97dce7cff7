//! Facade error type and server message normalization.

use std::fmt;

use rdk_schemas::ValidationError;
use serde_json::Value;

/// Shown when a failed response carries no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Errors returned by every [`crate::RentalApi`] operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected client-side before any request was sent.
    Validation(String),
    /// The request never produced an HTTP response (connect, timeout, TLS).
    Transport(String),
    /// The backend answered with a non-success status.
    Server { status: u16, message: String },
    /// A success response could not be decoded into the expected shape.
    Decode(String),
}

/// Display-only classification of an [`ApiError`].
///
/// Nothing retries on this; it selects wording and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The OTP was wrong or expired.
    OtpRejected,
    /// Server state disagrees with the request (already rented, duplicate).
    StateConflict,
    /// Login refused until the e-mail OTP is verified.
    NotVerified,
    Other,
}

impl ApiError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ApiError::Server {
            status,
            message: message.into(),
        }
    }

    /// Text suitable for showing to the user. Server messages pass through
    /// verbatim.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Validation(m) | ApiError::Transport(m) | ApiError::Decode(m) => m,
            ApiError::Server { message, .. } => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        let ApiError::Server { status, message } = self else {
            return ErrorKind::Other;
        };
        let lower = message.to_ascii_lowercase();
        if *status == 403 && lower.contains("not verified") {
            return ErrorKind::NotVerified;
        }
        if lower.contains("otp") && (lower.contains("invalid") || lower.contains("expired")) {
            return ErrorKind::OtpRejected;
        }
        if *status == 409
            || lower.contains("already rented")
            || lower.contains("already exists")
            || lower.contains("not rented")
        {
            return ErrorKind::StateConflict;
        }
        ErrorKind::Other
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(m) => write!(f, "{m}"),
            ApiError::Transport(m) => write!(f, "transport error: {m}"),
            ApiError::Server { status, message } => write!(f, "{message} (http {status})"),
            ApiError::Decode(m) => write!(f, "decode error: {m}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.0)
    }
}

fn non_empty_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Pick the message to surface from an error body.
///
/// Precedence: top-level `message`, top-level `error`, then the same two
/// inside a `data` envelope, then `fallback`.
pub fn normalize_error_message(body: Option<&Value>, fallback: &str) -> String {
    let Some(body) = body else {
        return fallback.to_string();
    };
    let nested = body.get("data");
    non_empty_str(body, "message")
        .or_else(|| non_empty_str(body, "error"))
        .or_else(|| nested.and_then(|d| non_empty_str(d, "message")))
        .or_else(|| nested.and_then(|d| non_empty_str(d, "error")))
        .unwrap_or(fallback)
        .to_string()
}
