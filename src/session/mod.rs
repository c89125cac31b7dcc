//! In-memory session state and the manager that owns it.

pub mod errors;
pub mod manager;

pub use errors::SessionError;
pub use manager::SessionManager;

use crate::auth::{LoginResponse, ValidationResponse};
use secrecy::SecretString;
use std::fmt;

/// The signed-in user, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl User {
    #[must_use]
    pub fn from_login(response: &LoginResponse) -> Self {
        Self {
            id: response.user_id.clone(),
            username: response.username.clone(),
            email: response.email.clone(),
            roles: response.roles.clone(),
        }
    }

    /// Rebuilds a user from a validation response. Returns `None` without a username.
    #[must_use]
    pub fn from_validation(response: &ValidationResponse) -> Option<Self> {
        let username = response.username.clone().filter(|name| !name.is_empty())?;
        Some(Self {
            id: response.user_id.clone().unwrap_or_default(),
            username,
            email: None,
            roles: response.roles.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Recomputed on every call; never cached.
#[must_use]
pub const fn is_logged_in(session: &Session) -> bool {
    session.user.is_some() && session.access_token.is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    SignedOut,
    SigningIn,
    SignedIn,
    Refreshing,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignedOut => "signed out",
            Self::SigningIn => "signing in",
            Self::SignedIn => "signed in",
            Self::Refreshing => "refreshing",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
