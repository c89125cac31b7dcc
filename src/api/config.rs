//! Base URL resolution for the REST client. An explicit value wins, then the
//! `PORTAL_API_URL` environment variable, then the application's default
//! backend. Configuration values are public; do not store secrets here.

use std::{env, fmt, str::FromStr, time::Duration};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "PORTAL_API_URL";

/// Default transport timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which front end the session belongs to. The two applications talk to
/// backends on different default ports and require different capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Admin,
    Employee,
}

impl AppKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }

    #[must_use]
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::Admin => "http://localhost:8080",
            Self::Employee => "http://localhost:8081",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            other => Err(format!("unknown application: {other} (expected admin or employee)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    /// Resolves the base URL from an explicit value, the environment, or the app default.
    #[must_use]
    pub fn resolve(explicit: Option<&str>, app: AppKind) -> Self {
        resolve_with(explicit, env::var(API_URL_ENV).ok(), app)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn resolve_with(explicit: Option<&str>, from_env: Option<String>, app: AppKind) -> ApiConfig {
    let base_url = explicit
        .and_then(normalize_value)
        .or_else(|| from_env.as_deref().and_then(normalize_value))
        .unwrap_or_else(|| app.default_api_url().to_string());

    ApiConfig {
        base_url,
        timeout: Some(DEFAULT_TIMEOUT),
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
