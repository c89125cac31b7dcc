//! REST client shared by the auth service and any feature code. It resolves
//! request URLs, attaches the stored access token as a bearer credential, and
//! normalizes every failure into [`ApiError`]. It never retries; retry policy
//! belongs to the caller. Token values are never logged.

use super::{config::ApiConfig, errors::ApiError};
use crate::{
    storage::{read_token, TokenKey, TokenStore},
    APP_USER_AGENT,
};
use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Placeholder for requests without a body, e.g. `client.post(path, NO_BODY, &opts)`.
pub const NO_BODY: Option<&()> = None;

/// Per-request options.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Attach `Authorization: Bearer <access token>` when a token is stored.
    pub auth: bool,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            auth: true,
            headers: Vec::new(),
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the bearer header, used by login and refresh.
    #[must_use]
    pub fn without_auth(mut self) -> Self {
        self.auth = false;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// A successful response body before typing.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// HTTP 204.
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Types the body. `Empty` decodes from `null` and `Text` from a JSON string,
    /// so `()`, `Option<_>` and `String` are valid targets.
    ///
    /// # Errors
    /// Returns a `PARSE_ERROR` if the body does not match `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let value = match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        };
        serde_json::from_value(value)
            .map_err(|err| ApiError::parse(format!("Failed to decode response: {err}")))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(APP_USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::network(format!("Failed to initialize HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, NO_BODY, options)
            .await?
            .into_typed()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, body, options)
            .await?
            .into_typed()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, body, options)
            .await?
            .into_typed()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, body, options)
            .await?
            .into_typed()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, NO_BODY, options)
            .await?
            .into_typed()
    }

    /// Performs one request and returns the untyped body.
    ///
    /// # Errors
    /// `SERIALIZATION_ERROR` if the URL or body cannot be encoded, `NETWORK_ERROR` on
    /// transport failure or timeout, `HTTP_<status>` for non-2xx responses and
    /// `PARSE_ERROR` for a malformed JSON body.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = build_url(&self.base_url, path, &options.query)?;

        let mut builder = self.http.request(method.clone(), url.clone());
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if options.auth {
            if let Some(token) = read_token(self.tokens.as_ref(), TokenKey::AccessToken) {
                builder = builder.bearer_auth(token.expose_secret());
            }
        }

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|err| {
                ApiError::serialization(format!("Failed to encode request: {err}"))
            })?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(payload);
        }

        let span = info_span!(
            "api.request",
            http.method = %method,
            url = %url
        );
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status, &body));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ResponseBody::Empty);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        let text = response.text().await.map_err(map_request_error)?;

        if is_json {
            serde_json::from_str(&text)
                .map(ResponseBody::Json)
                .map_err(|err| ApiError::parse(format!("Failed to decode response: {err}")))
        } else {
            Ok(ResponseBody::Text(text))
        }
    }
}

/// Joins `path` onto `base_url`. When the base already ends in `/api` a leading
/// `/api` segment on the path is dropped so it is not duplicated.
///
/// # Errors
/// Returns a `SERIALIZATION_ERROR` if the result is not an absolute URL.
pub fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
    let base = base_url.trim().trim_end_matches('/');
    let mut path = path.trim();

    if base.ends_with("/api") && (path == "/api" || path.starts_with("/api/")) {
        path = &path["/api".len()..];
    }

    let joined = format!("{base}/{}", path.trim_start_matches('/'));
    let mut url = Url::parse(&joined)
        .map_err(|err| ApiError::serialization(format!("Invalid request URL {joined}: {err}")))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

/// Maps transport errors into `NETWORK_ERROR` with timeout detection.
fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::network("Request timed out. Please try again.")
    } else {
        ApiError::network(format!("Unable to reach the server: {err}"))
    }
}

/// Builds the error for a non-2xx response. 401/403 always carry the same
/// message; other statuses prefer the body's `message` or `error` field.
fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    let code = status.as_u16();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ApiError::http(code, "Authentication required", None);
    }

    let fallback = || format!("Request failed with {code}");

    match serde_json::from_str::<Value>(body) {
        Ok(details) => {
            let message = ["message", "error"]
                .iter()
                .find_map(|field| details.get(field).and_then(Value::as_str))
                .and_then(sanitize_body)
                .unwrap_or_else(fallback);
            ApiError::http(code, message, Some(details))
        }
        Err(_) => {
            let message = sanitize_body(body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(fallback);
            ApiError::http(code, message, None)
        }
    }
}

/// Trims and truncates a body for user-facing messages.
fn sanitize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}
