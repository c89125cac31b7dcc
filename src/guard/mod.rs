//! Route classification and redirect decisions.

pub mod provider;

pub use provider::{AuthProvider, DEFAULT_VALIDATION_INTERVAL};

use crate::{
    api::AppKind,
    auth::{has_capability, Capability},
    session::{is_logged_in, Session},
};
use std::fmt;

/// Outcome of a route check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Redirect(String),
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stay => f.write_str("stay"),
            Self::Redirect(route) => write!(f, "redirect to {route}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub protected: Vec<String>,
    pub auth_routes: Vec<String>,
    pub login: String,
    pub logout: String,
    pub home: String,
    pub access_denied: String,
}

impl RouteTable {
    #[must_use]
    pub fn for_app(app: AppKind) -> Self {
        let protected: &[&str] = match app {
            AppKind::Admin => &[
                "/",
                "/dashboard",
                "/users",
                "/projects",
                "/questions",
                "/feedbacks",
                "/departments",
                "/roles",
            ],
            AppKind::Employee => &["/", "/feedback", "/feedbacks", "/feedback-center"],
        };

        Self {
            protected: protected.iter().map(ToString::to_string).collect(),
            auth_routes: vec!["/login".to_string(), "/logout".to_string()],
            login: "/login".to_string(),
            logout: "/logout".to_string(),
            home: "/".to_string(),
            access_denied: "/access-denied".to_string(),
        }
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.protected.iter().any(|route| route_matches(route, &path))
    }

    #[must_use]
    pub fn is_auth_route(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.auth_routes.iter().any(|route| route_matches(route, &path))
    }

    /// Decides where a navigation to `path` should end up.
    #[must_use]
    pub fn decide(&self, path: &str, session: &Session, required: Capability) -> Navigation {
        let logged_in = is_logged_in(session);
        let protected = self.is_protected(path);

        if !logged_in && protected {
            return Navigation::Redirect(self.login.clone());
        }

        if logged_in && self.is_auth_route(path) && !route_matches(&self.logout, &normalize_path(path)) {
            return Navigation::Redirect(self.home.clone());
        }

        if logged_in && protected {
            let roles = session.user.as_ref().map_or(&[][..], |user| user.roles.as_slice());
            if !has_capability(roles, required) {
                return Navigation::Redirect(self.access_denied.clone());
            }
        }

        Navigation::Stay
    }
}

/// Strips query, fragment and trailing slashes. The root stays `/`.
fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');

    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/` matches only the root; other routes match themselves and any sub-path.
fn route_matches(route: &str, path: &str) -> bool {
    if route == "/" {
        return path == "/";
    }
    path == route
        || path
            .strip_prefix(route)
            .is_some_and(|rest| rest.starts_with('/'))
}
