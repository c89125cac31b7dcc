//! The session manager owns the in-memory [`Session`] and keeps it in step with
//! token storage. `sign_in`, `sign_out`, `refresh_tokens`,
//! `ensure_valid_session` and `restore` are serialized by a single-slot async
//! guard; composite operations run their inner steps under the guard they
//! already hold.
//!
//! State is kept behind a `std::sync::RwLock` that is never held across an
//! `.await`. Every mutation republishes the logged-in flag on a watch channel.

use super::{errors::SessionError, is_logged_in, Session, SessionPhase, User};
use crate::{
    auth::{has_capability, AuthService, Capability, ValidationResponse},
    storage::{clear_tokens, read_token, write_token, TokenKey, TokenOptions, TokenStore},
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard},
};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    SignIn,
    SignOut,
    Refresh,
    Validate,
    Restore,
}

#[derive(Debug, Default)]
struct Inner {
    session: Session,
    in_flight: Option<Operation>,
}

/// Holds the operation slot. Dropping it, including when the owning future is
/// cancelled, marks the operation finished before the slot is released.
struct InFlight<'a> {
    manager: &'a SessionManager,
    _slot: MutexGuard<'a, ()>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.manager.end();
    }
}

pub struct SessionManager {
    service: Arc<dyn AuthService>,
    tokens: Arc<dyn TokenStore>,
    capability: Capability,
    state: RwLock<Inner>,
    operation: Mutex<()>,
    logged_in: watch::Sender<bool>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("capability", &self.capability)
            .field("state", &self.read())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a signed-out manager. Call [`SessionManager::restore`] to pick up
    /// persisted tokens.
    #[must_use]
    pub fn new(
        service: Arc<dyn AuthService>,
        tokens: Arc<dyn TokenStore>,
        capability: Capability,
    ) -> Self {
        let (logged_in, _) = watch::channel(false);
        Self {
            service,
            tokens,
            capability,
            state: RwLock::new(Inner::default()),
            operation: Mutex::new(()),
            logged_in,
        }
    }

    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.capability
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.read().session.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().session.user.clone()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        is_logged_in(&self.read().session)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        let inner = self.read();
        match inner.in_flight {
            Some(Operation::SignIn) => SessionPhase::SigningIn,
            Some(Operation::Refresh) => SessionPhase::Refreshing,
            _ if is_logged_in(&inner.session) => SessionPhase::SignedIn,
            _ if inner.session.error.is_some() => SessionPhase::Error,
            _ => SessionPhase::SignedOut,
        }
    }

    /// Yields the logged-in flag whenever it changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_in.subscribe()
    }

    /// When the stored access token was last confirmed by the server.
    #[must_use]
    pub fn last_validation(&self) -> Option<DateTime<Utc>> {
        let marker = read_token(self.tokens.as_ref(), TokenKey::LastValidation)?;
        let millis = marker.expose_secret().trim().parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub fn clear_error(&self) {
        self.update(|inner| inner.session.error = None);
    }

    /// Signs in and persists both tokens. The returned roles must grant the
    /// manager's capability; otherwise nothing is persisted.
    ///
    /// # Errors
    /// Returns the backend error, or [`SessionError::AccessDenied`]. The message is
    /// also recorded in the session's `error` field.
    #[instrument(skip(self, password), fields(capability = %self.capability))]
    pub async fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, SessionError> {
        let _in_flight = self.enter(Operation::SignIn).await;
        self.update(|inner| inner.session.error = None);

        let result = self.sign_in_locked(username, password).await;
        if let Err(err) = &result {
            warn!(code = ?err.code(), "sign-in failed: {err}");
            clear_tokens(self.tokens.as_ref());
            let message = err.to_string();
            self.update(|inner| {
                inner.session = Session {
                    error: Some(message),
                    ..Session::default()
                };
            });
        }

        result
    }

    async fn sign_in_locked(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, SessionError> {
        let response = self.service.login(username, password).await?;

        if !has_capability(&response.roles, self.capability) {
            return Err(SessionError::AccessDenied(self.capability));
        }

        let store = self.tokens.as_ref();
        write_token(store, TokenKey::AccessToken, &response.access_token, &TokenOptions::default());
        write_token(store, TokenKey::RefreshToken, &response.refresh_token, &TokenOptions::default());

        let user = User::from_login(&response);
        let session = Session {
            user: Some(user.clone()),
            access_token: Some(SecretString::from(response.access_token)),
            refresh_token: Some(SecretString::from(response.refresh_token)),
            loading: true,
            error: None,
        };
        self.update(|inner| inner.session = session);

        info!(username = %user.username, "signed in");
        Ok(user)
    }

    /// Best-effort server logout, then clears persisted tokens and state. Never fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let _in_flight = self.enter(Operation::SignOut).await;
        self.sign_out_locked().await;
    }

    async fn sign_out_locked(&self) {
        let held = self.read().session.access_token.is_some()
            || read_token(self.tokens.as_ref(), TokenKey::AccessToken).is_some();

        if held {
            self.service.logout().await;
        }

        clear_tokens(self.tokens.as_ref());
        let was_logged_in = self.is_logged_in();
        self.update(|inner| inner.session = Session::default());

        if was_logged_in {
            info!("signed out");
        }
    }

    /// Exchanges the refresh token for a new access token. Only the access token
    /// changes; the refresh token is not rotated.
    ///
    /// # Errors
    /// [`SessionError::NoRefreshToken`] when none is held, or the backend error. Either
    /// way the session is cleared.
    #[instrument(skip(self))]
    pub async fn refresh_tokens(&self) -> Result<SecretString, SessionError> {
        let _in_flight = self.enter(Operation::Refresh).await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<SecretString, SessionError> {
        self.set_operation(Operation::Refresh);

        let held = self.read().session.refresh_token.clone();
        let Some(refresh_token) =
            held.or_else(|| read_token(self.tokens.as_ref(), TokenKey::RefreshToken))
        else {
            debug!("no refresh token available");
            self.expire();
            return Err(SessionError::NoRefreshToken);
        };

        match self.service.refresh(&refresh_token).await {
            Ok(response) => {
                write_token(
                    self.tokens.as_ref(),
                    TokenKey::AccessToken,
                    &response.access_token,
                    &TokenOptions::default(),
                );
                let access_token = SecretString::from(response.access_token);
                let token = access_token.clone();
                self.update(move |inner| {
                    if inner.session.user.is_some() {
                        inner.session.access_token = Some(token);
                        inner.session.refresh_token = Some(refresh_token);
                    }
                });
                info!("access token refreshed");
                Ok(access_token)
            }
            Err(err) => {
                warn!(code = %err.code, "token refresh failed: {err}");
                self.expire();
                Err(err.into())
            }
        }
    }

    /// Confirms the session with the server, refreshing once if the access token is
    /// rejected or has already expired from storage while a refresh token remains.
    /// Returns `false` after clearing the session when that fails too.
    #[instrument(skip(self))]
    pub async fn ensure_valid_session(&self) -> bool {
        let _in_flight = self.enter(Operation::Validate).await;
        self.ensure_locked().await
    }

    async fn ensure_locked(&self) -> bool {
        let store = self.tokens.as_ref();
        let (held_access, held_refresh) = {
            let inner = self.read();
            (
                inner.session.access_token.is_some(),
                inner.session.refresh_token.is_some(),
            )
        };
        let stored_access = read_token(store, TokenKey::AccessToken).is_some();

        if !(held_access
            || stored_access
            || held_refresh
            || read_token(store, TokenKey::RefreshToken).is_some())
        {
            debug!("no tokens held");
            self.sign_out_locked().await;
            return false;
        }

        if stored_access {
            match self.service.validate().await {
                Ok(validation) if validation.valid => {
                    self.mark_validated();
                    return true;
                }
                Ok(validation) => {
                    debug!(message = ?validation.message, "token reported invalid, refreshing");
                }
                Err(err) => {
                    debug!(code = %err.code, "token validation failed, refreshing");
                }
            }
        } else {
            // the bearer is read from storage, so validating now would only be rejected
            debug!("stored access token expired, refreshing");
        }

        if self.refresh_locked().await.is_ok() {
            return true;
        }

        self.sign_out_locked().await;
        false
    }

    /// Rebuilds the session from persisted tokens. The stored access token is
    /// validated, refreshing once if it is rejected or only the refresh token
    /// survived. The returned roles must grant the capability. On failure the
    /// persisted tokens are cleared.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> bool {
        let _in_flight = self.enter(Operation::Restore).await;
        self.restore_locked().await
    }

    async fn restore_locked(&self) -> bool {
        let store = self.tokens.as_ref();
        let mut access_token = read_token(store, TokenKey::AccessToken);
        let refresh_token = read_token(store, TokenKey::RefreshToken);
        if access_token.is_none() && refresh_token.is_none() {
            debug!("no persisted session");
            return false;
        }

        let mut validation = match access_token {
            Some(_) => self.validate_quietly().await,
            None => None,
        };
        if validation.is_none() {
            if let Some(refresh_token) = &refresh_token {
                match self.service.refresh(refresh_token).await {
                    Ok(response) => {
                        write_token(
                            store,
                            TokenKey::AccessToken,
                            &response.access_token,
                            &TokenOptions::default(),
                        );
                        access_token = Some(SecretString::from(response.access_token));
                        validation = self.validate_quietly().await;
                    }
                    Err(err) => debug!(code = %err.code, "refresh during restore failed"),
                }
            }
        }

        let user = validation.and_then(|validation| {
            if has_capability(&validation.roles, self.capability) {
                User::from_validation(&validation)
            } else {
                warn!(capability = %self.capability, "persisted session lacks capability");
                None
            }
        });

        let (Some(user), Some(access_token)) = (user, access_token) else {
            clear_tokens(store);
            self.update(|inner| inner.session = Session::default());
            return false;
        };

        self.mark_validated();
        info!(username = %user.username, "session restored");
        self.update(|inner| {
            inner.session = Session {
                user: Some(user),
                access_token: Some(access_token),
                refresh_token,
                loading: true,
                error: None,
            };
        });
        true
    }

    async fn validate_quietly(&self) -> Option<ValidationResponse> {
        match self.service.validate().await {
            Ok(validation) if validation.valid => Some(validation),
            Ok(_) => None,
            Err(err) => {
                debug!(code = %err.code, "validation failed");
                None
            }
        }
    }

    fn mark_validated(&self) {
        write_token(
            self.tokens.as_ref(),
            TokenKey::LastValidation,
            &Utc::now().timestamp_millis().to_string(),
            &TokenOptions::default(),
        );
    }

    /// Clears tokens and state after an unrecoverable refresh.
    fn expire(&self) {
        clear_tokens(self.tokens.as_ref());
        self.update(|inner| {
            inner.session = Session {
                error: Some(SESSION_EXPIRED.to_string()),
                loading: true,
                ..Session::default()
            };
        });
    }

    async fn enter(&self, operation: Operation) -> InFlight<'_> {
        let slot = self.operation.lock().await;
        self.begin(operation);
        InFlight {
            manager: self,
            _slot: slot,
        }
    }

    fn begin(&self, operation: Operation) {
        self.update(|inner| {
            inner.in_flight = Some(operation);
            inner.session.loading = true;
        });
    }

    fn set_operation(&self, operation: Operation) {
        self.update(|inner| inner.in_flight = Some(operation));
    }

    fn end(&self) {
        self.update(|inner| {
            inner.in_flight = None;
            inner.session.loading = false;
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut Inner)) {
        let logged_in = {
            let mut inner = self.state.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut inner);
            is_logged_in(&inner.session)
        };

        self.logged_in.send_if_modified(|current| {
            if *current == logged_in {
                false
            } else {
                *current = logged_in;
                true
            }
        });
    }
}
