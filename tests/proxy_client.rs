mod common;

use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use admin_console::auth::RequestHeaders;
use admin_console::proxy::{ProxyClient, ProxyError};
use common::spawn_server;

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({ "authorization": auth }))
}

async fn backend() -> Result<String> {
    let api = Router::new()
        .route("/no-content", get(|| async { StatusCode::NO_CONTENT }))
        .route("/empty", get(|| async { StatusCode::OK }))
        .route("/whoami", get(echo_auth))
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route("/plain-error", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }))
        .route(
            "/detail-error",
            get(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "detail": "X" }))).into_response() }),
        )
        .route(
            "/nested-error",
            get(|| async {
                (StatusCode::CONFLICT, Json(json!({ "error": { "message": "already exists" } }))).into_response()
            }),
        )
        .route("/unauthorized", get(|| async { StatusCode::UNAUTHORIZED }))
        .route("/not-json", get(|| async { "definitely not json" }));

    spawn_server(Router::new().nest("/api/proxy", api)).await
}

#[tokio::test]
async fn empty_answers_are_none() -> Result<()> {
    let client = ProxyClient::new(backend().await?);

    let none: Option<Value> = client.get("no-content").await?;
    assert!(none.is_none());

    let none: Option<Value> = client.get("/empty").await?;
    assert!(none.is_none());

    Ok(())
}

#[tokio::test]
async fn json_bodies_round_trip_with_credentials() -> Result<()> {
    let headers = RequestHeaders::new().with_bearer_token("tok-123");
    let client = ProxyClient::new(backend().await?).with_headers(headers);

    let v: Option<Value> = client.get("whoami").await?;
    assert_eq!(v, Some(json!({ "authorization": "Bearer tok-123" })));

    let v: Option<Value> = client.post("echo", &json!({ "a": [1, 2] })).await?;
    assert_eq!(v, Some(json!({ "a": [1, 2] })));

    Ok(())
}

#[tokio::test]
async fn error_statuses_become_errors_with_best_message() -> Result<()> {
    let client = ProxyClient::new(backend().await?);

    let err = client.get::<Value>("plain-error").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "boom");

    let err = client.get::<Value>("detail-error").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "X");

    let err = client.get::<Value>("nested-error").await.unwrap_err();
    assert_eq!(err.to_string(), "already exists");

    let err = client.get::<Value>("unauthorized").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Authentication failed");

    let err = client.get::<Value>("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    Ok(())
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() -> Result<()> {
    let client = ProxyClient::new(backend().await?);

    let err = client.get::<Value>("not-json").await.unwrap_err();
    assert!(matches!(err, ProxyError::Decode(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() -> Result<()> {
    let client = ProxyClient::new("http://127.0.0.1:1");

    let err = client.get::<Value>("jobs").await.unwrap_err();
    assert!(matches!(err, ProxyError::Network(_)), "got {err:?}");
    assert_eq!(err.status(), None);

    Ok(())
}
