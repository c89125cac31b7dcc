//! Named token persistence. The session manager is the only writer; the API
//! client only reads the access token. Three media are provided: an in-memory
//! map, a cookie jar with per-key max-age, and a JSON file that plays the role of
//! browser local storage.
//!
//! Every medium reports failures through [`StorageError`], but callers on the
//! session path go through the lenient helpers ([`read_token`], [`write_token`],
//! [`remove_token`], [`clear_tokens`]) which log and treat a failure as a cache
//! miss. Token values must never appear in logs.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::{Clock, CookieStore, SameSite};
pub use file::FileStore;
pub use memory::MemoryStore;

use secrecy::SecretString;
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::warn;

/// Keys the session layer persists. `clear` only ever touches these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    AccessToken,
    RefreshToken,
    LastValidation,
}

impl TokenKey {
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::LastValidation];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::LastValidation => "lastValidation",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-write options. Media without expiry ignore `max_age`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenOptions {
    pub max_age: Option<Duration>,
}

impl TokenOptions {
    #[must_use]
    pub const fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("token storage lock poisoned")]
    Poisoned,
}

/// A persistence medium for named tokens.
pub trait TokenStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or expired.
    ///
    /// # Errors
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: TokenKey) -> Result<Option<SecretString>, StorageError>;

    /// # Errors
    /// Returns an error if the medium cannot be written.
    fn set(&self, key: TokenKey, value: &str, options: &TokenOptions) -> Result<(), StorageError>;

    /// # Errors
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: TokenKey) -> Result<(), StorageError>;

    /// Removes every known token key, leaving unrelated entries alone.
    ///
    /// # Errors
    /// Returns the first error reported by [`TokenStore::remove`].
    fn clear(&self) -> Result<(), StorageError> {
        for key in TokenKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Reads a token, treating storage failures as absent.
pub fn read_token(store: &dyn TokenStore, key: TokenKey) -> Option<SecretString> {
    match store.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(%key, "token read failed, treating as absent: {err}");
            None
        }
    }
}

/// Writes a token, logging and ignoring storage failures.
pub fn write_token(store: &dyn TokenStore, key: TokenKey, value: &str, options: &TokenOptions) {
    if let Err(err) = store.set(key, value, options) {
        warn!(%key, "token write failed: {err}");
    }
}

/// Removes a token, logging and ignoring storage failures.
pub fn remove_token(store: &dyn TokenStore, key: TokenKey) {
    if let Err(err) = store.remove(key) {
        warn!(%key, "token removal failed: {err}");
    }
}

/// Clears every known token key. Each key is attempted even if an earlier one fails.
pub fn clear_tokens(store: &dyn TokenStore) {
    for key in TokenKey::ALL {
        remove_token(store, key);
    }
}
