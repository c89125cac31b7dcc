use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Machine-readable error code, rendered as `NETWORK_ERROR`, `HTTP_<status>`,
/// `SERIALIZATION_ERROR` or `PARSE_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Network,
    Http(u16),
    Serialization,
    Parse,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("NETWORK_ERROR"),
            Self::Http(status) => write!(f, "HTTP_{status}"),
            Self::Serialization => f.write_str("SERIALIZATION_ERROR"),
            Self::Parse => f.write_str("PARSE_ERROR"),
        }
    }
}

/// Normalized failure of a REST call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub code: ErrorCode,
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    fn new(code: ErrorCode, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            code,
            details,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message, None)
    }

    #[must_use]
    pub fn http(status: u16, message: impl Into<String>, details: Option<Value>) -> Self {
        Self::new(ErrorCode::Http(status), message, details)
    }

    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message, None)
    }

    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Parse, message, None)
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.code {
            ErrorCode::Http(status) => Some(status),
            _ => None,
        }
    }

    /// 401 and 403 signal that the session must re-authenticate.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.code, ErrorCode::Http(401 | 403))
    }
}
