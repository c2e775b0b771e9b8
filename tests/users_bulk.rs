mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{send, test_app, user, FakeAuthBackend};

fn backend() -> Arc<FakeAuthBackend> {
    Arc::new(
        FakeAuthBackend::with_users(vec![
            user("root", "Root Admin", Some("admin")),
            user("u1", "Other Admin", Some("admin")),
            user("u2", "Flaky User", Some("user")),
            user("u3", "Plain User", None),
            user("m1", "Mod", Some("moderator")),
        ])
        .failing_for("u2"),
    )
}

#[tokio::test]
async fn bulk_ban_skips_admins_and_reports_partial_failure() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({
        "userIds": ["u1", "u2", "u3"],
        "action": { "type": "ban", "reason": "cleanup" }
    });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK, "partial failure must not fail the call: {v}");
    assert_eq!(v["succeeded"], json!(["u3"]));
    assert_eq!(v["skipped"], json!(["u1"]));
    assert_eq!(v["failed"][0]["userId"], "u2");
    assert!(v["failed"][0]["message"].as_str().unwrap().contains("backend refused u2"));

    // the admin was never sent to the backend
    assert!(!fake.calls().contains(&"ban_user:u1".to_string()));
    assert_eq!(fake.user("u3").and_then(|u| u.banned), Some(true));
    assert_eq!(fake.user("u1").and_then(|u| u.banned), Some(false));

    Ok(())
}

#[tokio::test]
async fn bulk_fails_when_every_attempt_fails() -> Result<()> {
    let app = test_app(backend());

    let body = json!({ "userIds": ["u2"], "action": { "type": "unban" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(v["message"].as_str().unwrap().contains("all 1 operations failed"));

    Ok(())
}

#[tokio::test]
async fn bulk_with_only_skipped_targets_succeeds() -> Result<()> {
    let app = test_app(backend());

    let body = json!({ "userIds": ["u1"], "action": { "type": "delete" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["skipped"], json!(["u1"]));
    assert!(v["succeeded"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn bulk_role_change_touches_admins_too() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({ "userIds": ["u1", "u3"], "action": { "type": "set_role", "role": "moderator" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["succeeded"], json!(["u1", "u3"]));
    assert_eq!(fake.user("u1").and_then(|u| u.role), Some("moderator".to_string()));

    Ok(())
}

#[tokio::test]
async fn bulk_respects_the_callers_grants() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    // u3 has the default `user` role and holds no user grants
    let body = json!({ "userIds": ["u2"], "action": { "type": "revoke_sessions" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("u3"), Some(body)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(v["error"], "forbidden");
    assert_eq!(v["message"], "forbidden: INSUFFICIENT_PERMISSIONS");

    let body = json!({ "userIds": ["u2", "u3"], "action": { "type": "unban" } });
    let (status, _) = send(&app, "POST", "/api/admin/users/bulk", Some("u3"), Some(body)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(fake.calls().is_empty(), "denied runs must not reach the backend: {:?}", fake.calls());

    Ok(())
}

#[tokio::test]
async fn bulk_without_a_session_is_unauthorized() -> Result<()> {
    let app = test_app(backend());

    let body = json!({ "userIds": ["u3"], "action": { "type": "delete" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", None, Some(body)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v["message"], "unauthorized: UNAUTHORIZED");

    Ok(())
}

#[tokio::test]
async fn bulk_checks_the_grant_of_the_requested_action() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    // moderators may ban but not delete
    let body = json!({ "userIds": ["u3"], "action": { "type": "delete" } });
    let (status, _) = send(&app, "POST", "/api/admin/users/bulk", Some("m1"), Some(body)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(fake.user("u3").is_some());

    let body = json!({ "userIds": ["u3"], "action": { "type": "ban" } });
    let (status, v) = send(&app, "POST", "/api/admin/users/bulk", Some("m1"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["succeeded"], json!(["u3"]));

    Ok(())
}
