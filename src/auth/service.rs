use super::types::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, ValidationResponse,
};
use crate::api::{ApiClient, ApiError, RequestOptions, NO_BODY};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const VALIDATE_PATH: &str = "/api/auth/validate";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// The four auth endpoints. The session manager talks to the backend only
/// through this trait.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges credentials for a token pair. Sent without a bearer token.
    async fn login(&self, username: &str, password: &SecretString)
        -> Result<LoginResponse, ApiError>;

    /// Exchanges the refresh token for a new access token. Sent without a bearer token.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshResponse, ApiError>;

    /// Checks the stored access token with the server.
    async fn validate(&self) -> Result<ValidationResponse, ApiError>;

    /// Best-effort server logout. Failures are logged, never returned.
    async fn logout(&self);
}

#[derive(Clone, Debug)]
pub struct HttpAuthService {
    client: ApiClient,
}

impl HttpAuthService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        debug!(username, "requesting login");
        self.client
            .post(LOGIN_PATH, Some(&body), &RequestOptions::new().without_auth())
            .await
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshResponse, ApiError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.expose_secret(),
        };
        self.client
            .post(REFRESH_PATH, Some(&body), &RequestOptions::new().without_auth())
            .await
    }

    async fn validate(&self) -> Result<ValidationResponse, ApiError> {
        self.client.get(VALIDATE_PATH, &RequestOptions::new()).await
    }

    async fn logout(&self) {
        if let Err(err) = self
            .client
            .post::<(), Value>(LOGOUT_PATH, NO_BODY, &RequestOptions::new())
            .await
        {
            warn!(code = %err.code, "server logout failed: {err}");
        }
    }
}
