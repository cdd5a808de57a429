//! Common test utilities for adversus-bridge integration tests
//!
//! This module provides:
//! - Router construction against a fake upstream
//! - Request builders carrying the shared secret
//! - A helper that runs a request and decodes the JSON body

use adversus_bridge_api::{config::BridgeConfig, create_router, AppState};
use adversus_bridge_client::{AdversusClient, ClientConfig};
use adversus_bridge_core::{events::MemoryEventSink, pacing::NoopPacer};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Shared secret configured into every test router.
pub const TEST_SECRET: &str = "integration-secret";

/// Build the full router against the given upstream base URL.
#[allow(dead_code)]
pub fn app_with_upstream(base_url: &str) -> Router {
    let mut config = BridgeConfig::default();
    config.webhook.secret = TEST_SECRET.to_string();
    config.upstream.base_url = base_url.to_string();

    let client = AdversusClient::new(ClientConfig::new(base_url, "apiuser", "apipass"))
        .expect("test client should build");

    let state = AppState::new(
        config,
        Arc::new(client),
        Arc::new(MemoryEventSink::default()),
        Arc::new(NoopPacer),
    );
    create_router(state)
}

/// Build a router whose upstream is unreachable; webhook tests never touch
/// the upstream.
#[allow(dead_code)]
pub fn app_without_upstream() -> Router {
    app_with_upstream("http://127.0.0.1:9")
}

/// POST a webhook payload, optionally with a secret header.
#[allow(dead_code)]
pub fn webhook_request(payload: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/adversus")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-adversus-secret", secret);
    }
    builder
        .body(Body::from(payload.to_string()))
        .expect("request should build")
}

/// GET a path with the valid secret header attached.
#[allow(dead_code)]
pub fn authorized_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-adversus-secret", TEST_SECRET)
        .body(Body::empty())
        .expect("request should build")
}

/// Run one request through the router and decode the response body as JSON.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should complete");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, json)
}
