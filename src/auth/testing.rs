//! Scripted [`AuthService`] for session and guard tests.

#![allow(clippy::unwrap_used)]

use super::{
    service::AuthService,
    types::{LoginResponse, RefreshResponse, ValidationResponse},
};
use crate::api::ApiError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{collections::VecDeque, sync::Mutex, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Login(String),
    Refresh(String),
    Validate,
    Logout,
}

/// Replays queued results in order. An unscripted call fails with HTTP 500.
#[derive(Default)]
pub(crate) struct ScriptedAuthService {
    logins: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    refreshes: Mutex<VecDeque<Result<RefreshResponse, ApiError>>>,
    validations: Mutex<VecDeque<Result<ValidationResponse, ApiError>>>,
    refresh_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedAuthService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn login_ok(self, access: &str, refresh: &str, roles: &[&str]) -> Self {
        self.logins.lock().unwrap().push_back(Ok(login_response(access, refresh, roles)));
        self
    }

    pub(crate) fn login_err(self, err: ApiError) -> Self {
        self.logins.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn refresh_ok(self, access: &str) -> Self {
        self.refreshes.lock().unwrap().push_back(Ok(RefreshResponse {
            access_token: access.to_string(),
        }));
        self
    }

    pub(crate) fn refresh_err(self, err: ApiError) -> Self {
        self.refreshes.lock().unwrap().push_back(Err(err));
        self
    }

    /// Every refresh sleeps for `delay` before answering.
    pub(crate) fn refresh_delay(self, delay: Duration) -> Self {
        *self.refresh_delay.lock().unwrap() = Some(delay);
        self
    }

    pub(crate) fn validate_ok(self, roles: &[&str]) -> Self {
        self.validations.lock().unwrap().push_back(Ok(ValidationResponse {
            valid: true,
            user_id: Some("1".to_string()),
            username: Some("alice".to_string()),
            roles: roles.iter().map(ToString::to_string).collect(),
            message: None,
        }));
        self
    }

    pub(crate) fn validate_invalid(self) -> Self {
        self.validations.lock().unwrap().push_back(Ok(ValidationResponse {
            valid: false,
            message: Some("Token expired".to_string()),
            ..ValidationResponse::default()
        }));
        self
    }

    pub(crate) fn validate_err(self, err: ApiError) -> Self {
        self.validations.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) fn login_response(access: &str, refresh: &str, roles: &[&str]) -> LoginResponse {
    LoginResponse {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        user_id: "1".to_string(),
        username: "alice".to_string(),
        email: Some("alice@example.com".to_string()),
        roles: roles.iter().map(ToString::to_string).collect(),
    }
}

fn unscripted() -> ApiError {
    ApiError::http(500, "unscripted call", None)
}

#[async_trait]
impl AuthService for ScriptedAuthService {
    async fn login(
        &self,
        username: &str,
        _password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login(username.to_string()));
        let next = self.logins.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshResponse, ApiError> {
        self.record(Call::Refresh(refresh_token.expose_secret().to_string()));
        let delay = *self.refresh_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.refreshes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn validate(&self) -> Result<ValidationResponse, ApiError> {
        self.record(Call::Validate);
        let next = self.validations.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unscripted()))
    }

    async fn logout(&self) {
        self.record(Call::Logout);
    }
}
