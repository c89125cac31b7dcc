#![allow(clippy::unwrap_used)]

mod common;

use common::Backend;
use portal_session::{
    api::{ApiClient, ApiConfig, AppKind, ErrorCode, RequestOptions, NO_BODY},
    storage::{MemoryStore, TokenKey, TokenOptions, TokenStore},
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

fn client_for(base_url: &str, tokens: Arc<dyn TokenStore>) -> ApiClient {
    let config = ApiConfig::resolve(Some(base_url), AppKind::Employee);
    ApiClient::new(&config, tokens).unwrap()
}

fn store_with_access_token(token: &str) -> Arc<dyn TokenStore> {
    let store = MemoryStore::new();
    store
        .set(TokenKey::AccessToken, token, &TokenOptions::default())
        .unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn attaches_bearer_token_by_default() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, store_with_access_token("A1"));

    let body: Value = client.get("/api/echo", &RequestOptions::new()).await.unwrap();

    assert_eq!(body["authorization"], "Bearer A1");
}

#[tokio::test]
async fn unauthenticated_requests_never_carry_a_token() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, store_with_access_token("A1"));

    let body: Value = client
        .get("/api/echo", &RequestOptions::new().without_auth())
        .await
        .unwrap();

    assert_eq!(body["authorization"], Value::Null);
    assert_eq!(
        backend.requests_to("/api/echo")[0].authorization,
        None
    );
}

#[tokio::test]
async fn no_stored_token_means_no_header() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, Arc::new(MemoryStore::new()));

    let body: Value = client.get("/api/echo", &RequestOptions::new()).await.unwrap();

    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn forwards_headers_and_query() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, Arc::new(MemoryStore::new()));

    let options = RequestOptions::new()
        .header("X-Request-Id", "abc-123")
        .query("category", "late delivery")
        .query("page", "2");
    let body: Value = client.get("/api/echo", &options).await.unwrap();

    assert_eq!(body["requestId"], "abc-123");
    assert_eq!(body["query"]["category"], "late delivery");
    assert_eq!(body["query"]["page"], "2");
}

#[tokio::test]
async fn base_url_ending_in_api_is_not_doubled() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&format!("{url}/api/"), Arc::new(MemoryStore::new()));

    let body: Value = client.get("/api/echo", &RequestOptions::new()).await.unwrap();

    assert_eq!(body["authorization"], Value::Null);
    assert_eq!(backend.requests_to("/api/echo").len(), 1);
}

#[tokio::test]
async fn text_and_empty_bodies() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, Arc::new(MemoryStore::new()));

    let text: String = client.get("/api/text", &RequestOptions::new()).await.unwrap();
    assert_eq!(text, "pong");

    let empty: Option<Value> = client
        .post("/api/empty", NO_BODY, &RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(empty, None);
}

#[tokio::test]
async fn server_errors_carry_body_message() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, Arc::new(MemoryStore::new()));

    let err = client
        .get::<Value>("/api/fail", &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Http(500));
    assert_eq!(err.code.to_string(), "HTTP_500");
    assert_eq!(err.message, "database unavailable");
    assert_eq!(err.details.unwrap()["status"], 500);
}

#[tokio::test]
async fn unauthorized_is_reported_uniformly() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let client = client_for(&url, store_with_access_token("stale"));

    let err = client
        .get::<Value>("/api/auth/validate", &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Http(401));
    assert_eq!(err.message, "Authentication required");
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), Arc::new(MemoryStore::new()));
    let err = client
        .get::<Value>("/api/echo", &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Network);
    assert_eq!(err.code.to_string(), "NETWORK_ERROR");
}

#[tokio::test]
async fn slow_responses_time_out() {
    let backend = Backend::new();
    let url = backend.spawn().await;
    let config = ApiConfig::resolve(Some(&url), AppKind::Employee)
        .with_timeout(Some(Duration::from_millis(200)));
    let client = ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap();

    let err = client
        .get::<String>("/api/slow", &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Network);
    assert_eq!(err.message, "Request timed out. Please try again.");
}
