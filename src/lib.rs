//! # portal-session (feedback portal session lifecycle)
//!
//! `portal-session` owns the client side of authentication for the feedback
//! portal: the admin dashboard and the employee portal both sign in against the
//! same REST backend and keep a short-lived access token alive with a
//! long-lived refresh token.
//!
//! ## Layers
//!
//! - [`storage`]: named token persistence (memory, cookie jar, JSON file). Storage
//!   failures are typed but read as "no token" through the lenient helpers.
//! - [`api`]: REST client that resolves the base URL, attaches the bearer token and
//!   normalizes error shapes into [`api::ApiError`].
//! - [`auth`]: the four auth endpoints plus the shared capability predicate.
//! - [`session`]: the session manager. It is the only writer of session state and
//!   serializes sign-in, sign-out, refresh and validation.
//! - [`guard`]: route decisions and the periodic re-validation keeper.
//!
//! ## Session Lifecycle
//!
//! 1. **Sign in:** `POST /api/auth/login` without a bearer token. The returned roles
//!    must grant the application's capability, otherwise the sign-in is rejected
//!    and nothing is persisted.
//! 2. **Keep alive:** every ~10 minutes `GET /api/auth/validate`. A rejected token is
//!    exchanged once through `POST /api/auth/refresh`; the refresh token is never
//!    rotated.
//! 3. **Sign out:** best-effort `POST /api/auth/logout`, then local state and
//!    persisted tokens are cleared unconditionally.
//!
//! Token material is held in [`secrecy::SecretString`] and must never be logged.

pub mod api;
pub mod auth;
pub mod cli;
pub mod guard;
pub mod session;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
