//! In-process mock of the portal auth backend.

#![allow(dead_code, clippy::unwrap_used)]

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct BackendState {
    issued: u32,
    access_tokens: HashMap<String, &'static str>,
    refresh_tokens: HashMap<String, &'static str>,
    refresh_disabled: bool,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct Backend {
    state: Arc<Mutex<BackendState>>,
}

struct Account {
    id: u64,
    username: &'static str,
    password: &'static str,
    roles: &'static [&'static str],
}

static ACCOUNTS: [Account; 3] = [
    Account {
        id: 1,
        username: "alice",
        password: "pw",
        roles: &["employee"],
    },
    Account {
        id: 2,
        username: "root",
        password: "pw",
        roles: &["ROLE_ADMIN"],
    },
    Account {
        id: 3,
        username: "guest",
        password: "pw",
        roles: &["guest"],
    },
];

fn account(username: &str) -> Option<&'static Account> {
    ACCOUNTS.iter().find(|account| account.username == username)
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the mock on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/validate", get(validate))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .route("/api/echo", get(echo))
            .route("/api/text", get(text))
            .route("/api/empty", post(empty))
            .route("/api/fail", get(fail))
            .route("/api/slow", get(slow))
            .with_state(self.clone());

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });

        format!("http://{addr}")
    }

    /// Invalidates every access token, as if they had all expired.
    pub fn expire_access_tokens(&self) {
        self.state.lock().unwrap().access_tokens.clear();
    }

    pub fn disable_refresh(&self) {
        self.state.lock().unwrap().refresh_disabled = true;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    fn record(&self, path: &str, headers: &HeaderMap) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        self.state.lock().unwrap().requests.push(Recorded {
            path: path.to_string(),
            authorization,
        });
    }

    fn issue_access_token(&self, username: &'static str) -> String {
        let mut state = self.state.lock().unwrap();
        state.issued += 1;
        let token = format!("A{}", state.issued);
        state.access_tokens.insert(token.clone(), username);
        token
    }

    fn bearer_user(&self, headers: &HeaderMap) -> Option<&'static str> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.state.lock().unwrap().access_tokens.get(token).copied()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Full authentication is required"})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Response {
    backend.record("/api/auth/login", &headers);

    let Some(account) = account(&body.username).filter(|a| a.password == body.password) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Bad credentials"})),
        )
            .into_response();
    };

    let access_token = backend.issue_access_token(account.username);
    let refresh_token = format!("R{}", account.id);
    backend
        .state
        .lock()
        .unwrap()
        .refresh_tokens
        .insert(refresh_token.clone(), account.username);

    Json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
        "userId": account.id,
        "username": account.username,
        "email": format!("{}@example.com", account.username),
        "roles": account.roles,
    }))
    .into_response()
}

async fn validate(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.record("/api/auth/validate", &headers);

    let Some(account) = backend.bearer_user(&headers).and_then(account) else {
        return unauthorized();
    };

    Json(json!({
        "valid": true,
        "userId": account.id,
        "username": account.username,
        "roles": account.roles,
        "message": "Token is valid",
    }))
    .into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<RefreshBody>,
) -> Response {
    backend.record("/api/auth/refresh", &headers);

    let username = {
        let state = backend.state.lock().unwrap();
        if state.refresh_disabled {
            None
        } else {
            state.refresh_tokens.get(&body.refresh_token).copied()
        }
    };

    match username {
        Some(username) => {
            let access_token = backend.issue_access_token(username);
            Json(json!({"accessToken": access_token})).into_response()
        }
        None => unauthorized(),
    }
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> StatusCode {
    backend.record("/api/auth/logout", &headers);

    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        backend.state.lock().unwrap().access_tokens.remove(token);
    }
    StatusCode::NO_CONTENT
}

async fn echo(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.record("/api/echo", &headers);

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let custom = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok());

    Json(json!({
        "authorization": authorization,
        "requestId": custom,
        "query": query,
    }))
}

async fn text() -> &'static str {
    "pong"
}

async fn empty() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fail() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "database unavailable", "status": 500})),
    )
        .into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

/// A set of role names, for assertions.
pub fn roles(values: &[&str]) -> HashSet<String> {
    values.iter().map(ToString::to_string).collect()
}
