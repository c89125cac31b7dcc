use crate::{api::ApiError, auth::Capability};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The server accepted the credentials but the roles do not grant the capability.
    #[error("Access denied. {0} role required.")]
    AccessDenied(Capability),
    #[error("No refresh token available")]
    NoRefreshToken,
}

impl SessionError {
    /// The `ApiError` code, when the failure came from the backend.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        match self {
            Self::Api(err) => Some(err.code.to_string()),
            Self::AccessDenied(_) | Self::NoRefreshToken => None,
        }
    }
}
