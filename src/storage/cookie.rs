//! Cookie-jar token storage. Expiry is a property of the medium: each key gets
//! its own max-age (short for the access token, long for the refresh token) and
//! an expired cookie reads as absent. In production cookies are marked `Secure`
//! with `SameSite=Lax`. The jar can optionally be mirrored to a file so a CLI
//! process can pick the session up again.

use super::{
    file::{load_document, persist_document},
    StorageError, TokenKey, TokenOptions, TokenStore,
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_MAX_AGE: Duration = Duration::from_secs(15 * 60);
/// Refresh tokens and the validation marker live for 7 days.
pub const REFRESH_TOKEN_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Source of the current time for expiry decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const COOKIE_PATH: &str = "/";
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct Cookie {
    value: String,
    expires_at: DateTime<Utc>,
    secure: bool,
    same_site: Option<SameSite>,
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}

pub struct CookieStore {
    jar: Mutex<BTreeMap<String, Cookie>>,
    production: bool,
    path: Option<PathBuf>,
    clock: Clock,
}

impl fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("jar", &self.jar)
            .field("production", &self.production)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CookieStore {
    /// Creates an in-memory jar.
    #[must_use]
    pub fn new(production: bool) -> Self {
        Self {
            jar: Mutex::new(BTreeMap::new()),
            production,
            path: None,
            clock: Arc::new(Utc::now),
        }
    }

    /// Opens a jar mirrored to `path`, loading any cookies already stored there.
    ///
    /// # Errors
    /// Returns an error if an existing jar file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>, production: bool) -> Result<Self, StorageError> {
        let path = path.into();
        let jar: BTreeMap<String, Cookie> = load_document(&path)?;
        Ok(Self {
            jar: Mutex::new(jar),
            production,
            path: Some(path),
            clock: Arc::new(Utc::now),
        })
    }

    /// Replaces the wall clock used for expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Max-age applied when a write does not specify one.
    #[must_use]
    pub const fn default_max_age(key: TokenKey) -> Duration {
        match key {
            TokenKey::AccessToken => ACCESS_TOKEN_MAX_AGE,
            TokenKey::RefreshToken | TokenKey::LastValidation => REFRESH_TOKEN_MAX_AGE,
        }
    }

    /// Renders the `Set-Cookie` header for a live cookie.
    #[must_use]
    pub fn set_cookie_header(&self, key: TokenKey) -> Option<String> {
        self.set_cookie_header_at(key, (self.clock)())
    }

    /// Renders a `Set-Cookie` header that deletes the cookie on the client.
    #[must_use]
    pub fn removal_header(&self, key: TokenKey) -> String {
        let mut header =
            format!("{key}=; Path={COOKIE_PATH}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        if self.production {
            header.push_str("; Secure; SameSite=Lax");
        }
        header
    }

    fn set_cookie_header_at(&self, key: TokenKey, now: DateTime<Utc>) -> Option<String> {
        let jar = self.jar.lock().ok()?;
        let cookie = jar.get(key.as_str()).filter(|c| c.expires_at > now)?;

        let max_age = (cookie.expires_at - now).num_seconds().max(0);
        let mut header = format!(
            "{key}={}; Path={COOKIE_PATH}; Max-Age={max_age}; Expires={}",
            cookie.value,
            cookie.expires_at.format(EXPIRES_FORMAT)
        );
        if cookie.secure {
            header.push_str("; Secure");
        }
        if let Some(same_site) = cookie.same_site {
            header.push_str("; SameSite=");
            header.push_str(same_site.as_str());
        }
        Some(header)
    }

    fn get_at(&self, key: TokenKey, now: DateTime<Utc>) -> Result<Option<SecretString>, StorageError> {
        let mut jar = self.jar.lock().map_err(|_| StorageError::Poisoned)?;
        match jar.get(key.as_str()) {
            None => Ok(None),
            Some(cookie) if cookie.expires_at > now => {
                Ok(Some(SecretString::from(cookie.value.clone())))
            }
            Some(_) => {
                jar.remove(key.as_str());
                self.persist(&jar)?;
                Ok(None)
            }
        }
    }

    fn set_at(
        &self,
        key: TokenKey,
        value: &str,
        options: &TokenOptions,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let max_age = options.max_age.unwrap_or(Self::default_max_age(key));
        let cookie = Cookie {
            value: value.to_string(),
            expires_at: expiry(now, max_age),
            secure: self.production,
            same_site: self.production.then_some(SameSite::Lax),
        };

        let mut jar = self.jar.lock().map_err(|_| StorageError::Poisoned)?;
        jar.insert(key.as_str().to_string(), cookie);
        self.persist(&jar)
    }

    fn persist(&self, jar: &BTreeMap<String, Cookie>) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => persist_document(path, jar),
            None => Ok(()),
        }
    }
}

impl TokenStore for CookieStore {
    fn get(&self, key: TokenKey) -> Result<Option<SecretString>, StorageError> {
        self.get_at(key, (self.clock)())
    }

    fn set(&self, key: TokenKey, value: &str, options: &TokenOptions) -> Result<(), StorageError> {
        self.set_at(key, value, options, (self.clock)())
    }

    fn remove(&self, key: TokenKey) -> Result<(), StorageError> {
        let mut jar = self.jar.lock().map_err(|_| StorageError::Poisoned)?;
        if jar.remove(key.as_str()).is_some() {
            self.persist(&jar)?;
        }
        Ok(())
    }
}

fn expiry(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(max_age)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
