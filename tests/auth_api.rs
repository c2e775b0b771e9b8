mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{send, test_app, user, FakeAuthBackend};

fn backend() -> Arc<FakeAuthBackend> {
    Arc::new(
        FakeAuthBackend::with_users(vec![user("ada", "Ada Lovelace", None)])
            .with_password("ada@example.com", "analytical-engine"),
    )
}

#[tokio::test]
async fn sign_up_creates_an_account_that_can_sign_in() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "cobol-1959" });
    let (status, v) = send(&app, "POST", "/api/auth/sign-up", None, Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{v}");
    assert_eq!(v["user"]["email"], "grace@example.com");
    let token = v["token"].as_str().unwrap().to_string();

    let (status, v) = send(&app, "GET", "/api/auth/session", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["user"]["name"], "Grace Hopper");

    let body = json!({ "email": "grace@example.com", "password": "cobol-1959" });
    let (status, v) = send(&app, "POST", "/api/auth/sign-in", None, Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["token"], token.as_str());

    Ok(())
}

#[tokio::test]
async fn short_passwords_never_reach_the_auth_service() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({ "name": "Short", "email": "short@example.com", "password": "1234567" });
    let (status, v) = send(&app, "POST", "/api/auth/sign-up", None, Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "bad_request");
    assert!(v["message"].as_str().unwrap().contains("at least 8 characters"));

    let body = json!({ "currentPassword": "analytical-engine", "newPassword": "tiny" });
    let (status, _) = send(&app, "POST", "/api/auth/change-password", Some("ada"), Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(fake.calls().is_empty(), "{:?}", fake.calls());

    Ok(())
}

#[tokio::test]
async fn duplicate_sign_up_relays_the_auth_service_error() -> Result<()> {
    let app = test_app(backend());

    let body = json!({ "name": "Ada Again", "email": "ada@example.com", "password": "long-enough" });
    let (status, v) = send(&app, "POST", "/api/auth/sign-up", None, Some(body)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["error"], "upstream");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let app = test_app(backend());

    let body = json!({ "email": "ada@example.com", "password": "difference-engine" });
    let (status, v) = send(&app, "POST", "/api/auth/sign-in", None, Some(body)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(v["message"].as_str().unwrap().contains("invalid email or password"));

    Ok(())
}

#[tokio::test]
async fn change_password_checks_the_current_one() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({ "currentPassword": "wrong-password", "newPassword": "difference-engine" });
    let (status, _) = send(&app, "POST", "/api/auth/change-password", Some("ada"), Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "currentPassword": "analytical-engine", "newPassword": "difference-engine" });
    let (status, v) = send(&app, "POST", "/api/auth/change-password", Some("ada"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["message"], "password changed");

    let body = json!({ "email": "ada@example.com", "password": "difference-engine" });
    let (status, _) = send(&app, "POST", "/api/auth/sign-in", None, Some(body)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn session_endpoints_need_a_signed_in_caller() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let (status, v) = send(&app, "GET", "/api/auth/session", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(v["message"].as_str().unwrap().contains("no active session"));

    let (status, _) = send(&app, "POST", "/api/auth/sign-out", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, v) = send(&app, "POST", "/api/auth/sign-out", Some("ada"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["message"], "signed out");
    assert_eq!(fake.calls(), vec!["sign_out:ada".to_string()]);

    Ok(())
}
