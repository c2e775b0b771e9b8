mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

use common::{send, test_app, user, FakeAuthBackend};

fn backend() -> Arc<FakeAuthBackend> {
    Arc::new(
        FakeAuthBackend::with_users(vec![
            user("root", "Root Admin", Some("admin")),
            user("m1", "Mod", Some("moderator")),
            user("u1", "Plain User", Some("user")),
            user("u2", "Another User", None),
        ])
        .with_organization("acme"),
    )
}

/// Adds one member, one pending invitation and one team to `org-acme` as the admin.
async fn seed(app: &Router) -> Result<(String, String, String)> {
    let (status, member) = send(
        app,
        "POST",
        "/api/organizations/org-acme/members",
        Some("root"),
        Some(json!({ "userId": "u2", "role": "member" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{member}");

    let (status, invitation) = send(
        app,
        "POST",
        "/api/organizations/org-acme/invitations",
        Some("root"),
        Some(json!({ "email": "grace@example.com", "role": "member" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{invitation}");

    let (status, team) = send(
        app,
        "POST",
        "/api/organizations/org-acme/teams",
        Some("root"),
        Some(json!({ "name": "Platform" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{team}");

    let id = |v: &Value| v["id"].as_str().unwrap_or_default().to_string();
    Ok((id(&member), id(&invitation), id(&team)))
}

#[tokio::test]
async fn admin_creates_and_updates_organizations() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());

    let body = json!({ "name": "Globex", "slug": "globex" });
    let (status, v) = send(&app, "POST", "/api/organizations", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v["id"], "org-globex");
    assert_eq!(v["name"], "Globex");

    let (status, v) = send(&app, "GET", "/api/organizations", Some("root"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v.as_array().map(Vec::len), Some(2));

    let body = json!({ "name": "Globex Corp" });
    let (status, v) = send(&app, "PATCH", "/api/organizations/org-globex", Some("root"), Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["name"], "Globex Corp");
    assert_eq!(v["slug"], "globex");

    let (status, _) = send(&app, "DELETE", "/api/organizations/org-globex", Some("root"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(fake.organization("org-globex").is_none());

    let (status, v) = send(&app, "GET", "/api/organizations/org-globex", Some("root"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "upstream");

    Ok(())
}

#[tokio::test]
async fn admin_manages_members_invitations_and_teams() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());
    let (member_id, invitation_id, team_id) = seed(&app).await?;

    let (status, v) = send(&app, "GET", "/api/organizations/org-acme", Some("root"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["slug"], "acme");
    assert_eq!(v["members"][0]["userId"], "u2");
    assert_eq!(v["invitations"][0]["status"], "pending");
    assert_eq!(v["teams"][0]["name"], "Platform");

    let uri = format!("/api/organizations/org-acme/members/{member_id}");
    let (status, v) = send(&app, "PATCH", &uri, Some("root"), Some(json!({ "role": "owner" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["role"], "owner");

    let uri = format!("/api/organizations/invitations/{invitation_id}");
    let (status, _) = send(&app, "DELETE", &uri, Some("root"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, v) = send(&app, "GET", "/api/organizations/org-acme/invitations", Some("root"), None).await?;
    assert_eq!(v[0]["status"], "canceled");

    let uri = format!("/api/organizations/org-acme/teams/{team_id}");
    let (status, _) = send(&app, "DELETE", &uri, Some("root"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // members can be removed by email as well as by id
    let (status, _) = send(
        &app,
        "DELETE",
        "/api/organizations/org-acme/members/u2@example.com",
        Some("root"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let org = fake.organization("org-acme").unwrap();
    assert!(org.members.is_empty());
    assert!(org.teams.is_empty());

    Ok(())
}

#[tokio::test]
async fn plain_users_can_read_but_not_write() -> Result<()> {
    let fake = backend();
    let app = test_app(fake.clone());
    let (member_id, invitation_id, team_id) = seed(&app).await?;
    let before = fake.calls().len();

    for uri in [
        "/api/organizations",
        "/api/organizations/org-acme",
        "/api/organizations/org-acme/members",
        "/api/organizations/org-acme/invitations",
        "/api/organizations/org-acme/teams",
    ] {
        let (status, v) = send(&app, "GET", uri, Some("u1"), None).await?;
        assert_eq!(status, StatusCode::OK, "{uri}: {v}");
    }

    let member_uri = format!("/api/organizations/org-acme/members/{member_id}");
    let invitation_uri = format!("/api/organizations/invitations/{invitation_id}");
    let team_uri = format!("/api/organizations/org-acme/teams/{team_id}");
    let writes: Vec<(&str, &str, Option<Value>)> = vec![
        ("POST", "/api/organizations", Some(json!({ "name": "Mine", "slug": "mine" }))),
        ("PATCH", "/api/organizations/org-acme", Some(json!({ "name": "Renamed" }))),
        ("DELETE", "/api/organizations/org-acme", None),
        (
            "POST",
            "/api/organizations/org-acme/members",
            Some(json!({ "userId": "u1", "role": "owner" })),
        ),
        ("PATCH", member_uri.as_str(), Some(json!({ "role": "owner" }))),
        ("DELETE", member_uri.as_str(), None),
        (
            "POST",
            "/api/organizations/org-acme/invitations",
            Some(json!({ "email": "friend@example.com", "role": "member" })),
        ),
        ("DELETE", invitation_uri.as_str(), None),
        ("POST", "/api/organizations/org-acme/teams", Some(json!({ "name": "Shadow" }))),
        ("DELETE", team_uri.as_str(), None),
    ];
    for (method, uri, body) in writes {
        let (status, v) = send(&app, method, uri, Some("u1"), body).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}: {v}");
        assert_eq!(v["message"], "forbidden: INSUFFICIENT_PERMISSIONS");
    }

    assert_eq!(fake.calls().len(), before, "denied writes reached the backend");
    let org = fake.organization("org-acme").unwrap();
    assert_eq!(org.organization.name, "acme");
    assert_eq!(org.members.len(), 1);
    assert_eq!(org.invitations[0].status, "pending");
    assert_eq!(org.teams.len(), 1);

    Ok(())
}

#[tokio::test]
async fn moderators_hold_no_organization_grants() -> Result<()> {
    let app = test_app(backend());

    let (status, _) = send(&app, "GET", "/api/organizations", Some("m1"), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/organizations/org-acme/teams", Some("m1"), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn organizations_require_a_session() -> Result<()> {
    let app = test_app(backend());

    let (status, v) = send(&app, "GET", "/api/organizations", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v["error"], "unauthorized");

    let body = json!({ "name": "Anon", "slug": "anon" });
    let (status, _) = send(&app, "POST", "/api/organizations", None, Some(body)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
