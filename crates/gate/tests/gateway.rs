// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the proxy worker: interception round-trips against
//! a live echo backend.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use boardgate::config::GateConfig;
use boardgate::state::GateState;
use boardgate::worker::build_router;

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
fn install_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Backend stub: echoes the method, path, credential headers, and body.
async fn echo(req: Request) -> Json<serde_json::Value> {
    let (parts, body) = req.into_parts();
    let header = |name: &str| {
        parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
    };
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    Json(serde_json::json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "authorization": header("authorization"),
        "csrf": header("x-csrftoken"),
        "request_id": header("x-request-id"),
        "body": String::from_utf8_lossy(&bytes),
    }))
}

async fn spawn_backend() -> String {
    let app = Router::new().fallback(echo);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
    let addr = listener.local_addr().expect("backend addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn test_config(api_base: String, state_dir: &std::path::Path, max_logout_age_ms: u64) -> GateConfig {
    GateConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        api_base,
        ws_base: None,
        state_dir: Some(state_dir.to_path_buf()),
        max_logout_age_ms,
        refresh_timeout_ms: 2_000,
        refresh_threshold_secs: 300,
        heartbeat_ms: 30_000,
        backoff_base_ms: 100,
        backoff_max_ms: 1_000,
        max_retries: 3,
    }
}

async fn gate_server(
    api_base: String,
    dir: &std::path::Path,
    max_logout_age_ms: u64,
) -> (axum_test::TestServer, Arc<GateState>) {
    install_crypto();
    let config = test_config(api_base, dir, max_logout_age_ms);
    let state = Arc::new(GateState::new(config, CancellationToken::new()));
    state.activate();
    let server =
        axum_test::TestServer::new(build_router(Arc::clone(&state))).expect("create test server");
    (server, state)
}

async fn send_message(server: &axum_test::TestServer, msg: serde_json::Value) -> serde_json::Value {
    let resp = server.post("/gate/message").json(&msg).await;
    resp.assert_status(StatusCode::OK);
    resp.json()
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn health_reports_active_phase() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    let resp = server.get("/gate/health").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["phase"], "active");
    assert_eq!(body["suppressed"], false);
}

// -- SET_AUTH_TOKEN / CLEAR_AUTH_TOKEN round trips -----------------------------

#[tokio::test]
async fn set_token_then_request_attaches_it() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    let ack = send_message(
        &server,
        serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-abc"}),
    )
    .await;
    assert_eq!(ack["success"], true);

    let resp = server.get("/api/v1/tasks/").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], "Bearer tok-abc");
}

#[tokio::test]
async fn clear_token_then_request_attaches_nothing() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    send_message(&server, serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-abc"}))
        .await;
    send_message(&server, serde_json::json!({"type": "CLEAR_AUTH_TOKEN"})).await;

    let resp = server.get("/api/v1/tasks/").await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], serde_json::Value::Null);
}

// -- Suppression window --------------------------------------------------------

#[tokio::test]
async fn logout_strips_credentials_even_when_caller_sets_them() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    send_message(&server, serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-abc"}))
        .await;
    let ack = send_message(&server, serde_json::json!({"type": "LOGOUT"})).await;
    assert_eq!(ack["success"], true);
    assert!(ack["timestamp"].is_u64());

    let resp = server
        .get("/api/v1/tasks/")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer stale"),
        )
        .add_header(
            axum::http::HeaderName::from_static("x-csrftoken"),
            axum::http::HeaderValue::from_static("csrf-stale"),
        )
        .await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], serde_json::Value::Null);
    assert_eq!(body["csrf"], serde_json::Value::Null);
}

#[tokio::test]
async fn suppression_lapses_and_later_login_is_usable() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 50).await;

    send_message(&server, serde_json::json!({"type": "LOGOUT"})).await;
    // Login inside the window: still suppressed.
    send_message(&server, serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-new"}))
        .await;
    let resp = server.get("/api/v1/tasks/").await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], serde_json::Value::Null);

    // Window lapses on its own; no explicit re-enable.
    tokio::time::sleep(Duration::from_millis(80)).await;
    let resp = server.get("/api/v1/tasks/").await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], "Bearer tok-new");
}

// -- Bypass endpoints ----------------------------------------------------------

#[tokio::test]
async fn bypass_path_never_gets_auto_attached_token() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    send_message(&server, serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-abc"}))
        .await;

    let resp = server
        .post("/api/v1/auth/jwt/create/")
        .json(&serde_json::json!({"email": "d@example.com", "password": "pw"}))
        .await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], serde_json::Value::Null);
    assert_eq!(body["body"], r#"{"email":"d@example.com","password":"pw"}"#);
}

#[tokio::test]
async fn bypass_path_preserves_caller_set_header() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    let resp = server
        .post("/api/v1/auth/jwt/verify/")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer explicit"),
        )
        .json(&serde_json::json!({"token": "t"}))
        .await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["authorization"], "Bearer explicit");
}

// -- Request preservation ------------------------------------------------------

#[tokio::test]
async fn unrelated_headers_method_and_body_survive() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) = gate_server(backend, dir.path(), 300_000).await;

    send_message(&server, serde_json::json!({"type": "SET_AUTH_TOKEN", "token": "tok-abc"}))
        .await;

    let resp = server
        .patch("/api/v1/tasks/42/")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static("req-7"),
        )
        .json(&serde_json::json!({"title": "renamed"}))
        .await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["method"], "PATCH");
    assert_eq!(body["path"], "/api/v1/tasks/42/");
    assert_eq!(body["request_id"], "req-7");
    assert_eq!(body["authorization"], "Bearer tok-abc");
    assert_eq!(body["body"], r#"{"title":"renamed"}"#);
}

// -- Upstream failure ----------------------------------------------------------

#[tokio::test]
async fn unreachable_upstream_returns_502_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (server, _state) =
        gate_server("http://127.0.0.1:9".to_owned(), dir.path(), 300_000).await;

    let resp = server.get("/api/v1/tasks/").await;
    resp.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}
