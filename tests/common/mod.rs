#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use admin_console::auth::{
    AdminBackend, ApiKeyBackend, EmailPasswordBackend, OrganizationBackend, RequestHeaders, SessionBackend,
};
use admin_console::authz::Scopes;
use admin_console::config::AppConfig;
use admin_console::errors::{AppError, AppResult};
use admin_console::models::api_key::{
    ApiKey, ApiKeyVerification, CreateApiKeyRequest, CreatedApiKey, UpdateApiKeyRequest,
};
use admin_console::models::organization::{
    AddMemberRequest, CreateOrganizationRequest, FullOrganization, Invitation, InviteMemberRequest, Member,
    Organization, Team, UpdateOrganizationRequest,
};
use admin_console::models::session::{Session, SessionWithUser};
use admin_console::models::user::{
    AuthResponse, BanUserRequest, ChangePasswordRequest, CreateUserRequest, ListUsersQuery, SignInRequest,
    SignUpRequest, UpdateUserRequest, User, UserList,
};
use admin_console::{create_app, AppState};

pub fn user(id: &str, name: &str, role: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        role: role.map(str::to_string),
        banned: Some(false),
        ban_reason: None,
        ban_expires: None,
        email_verified: true,
        image: None,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        updated_at: None,
    }
}

pub fn session_for(user: &User) -> Session {
    Session {
        id: format!("session-{}", user.id),
        token: format!("session-token-{}", user.id),
        user_id: user.id.clone(),
        expires_at: Utc::now() + Duration::hours(1),
        ip_address: None,
        user_agent: None,
        impersonated_by: None,
        active_organization_id: None,
    }
}

/// In-memory stand-in for the auth service.
///
/// A bearer token equal to a user id signs that user in. Mutations on ids in
/// `failing` answer 500. Organizations, API keys and passwords live in memory.
#[derive(Default)]
pub struct FakeAuthBackend {
    users: Mutex<Vec<User>>,
    failing: HashSet<String>,
    api_keys: Mutex<HashMap<String, ApiKey>>,
    passwords: Mutex<HashMap<String, String>>,
    organizations: Mutex<Vec<FullOrganization>>,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
}

impl FakeAuthBackend {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub fn failing_for(mut self, user_id: &str) -> Self {
        self.failing.insert(user_id.to_string());
        self
    }

    pub fn with_api_key(mut self, key: &str, owner: &str, scopes: Scopes) -> Self {
        let api_key = ApiKey {
            id: format!("key-{owner}"),
            name: Some("test key".to_string()),
            prefix: None,
            start: Some(key.chars().take(4).collect()),
            user_id: owner.to_string(),
            enabled: true,
            expires_at: None,
            permissions: Some(scopes),
            created_at: Utc::now(),
        };
        self.api_keys.get_mut().unwrap().insert(key.to_string(), api_key);
        self
    }

    pub fn with_password(self, email: &str, password: &str) -> Self {
        self.passwords.lock().unwrap().insert(email.to_string(), password.to_string());
        self
    }

    pub fn with_organization(self, slug: &str) -> Self {
        self.organizations.lock().unwrap().push(FullOrganization {
            organization: organization(slug),
            members: Vec::new(),
            invitations: Vec::new(),
            teams: Vec::new(),
        });
        self
    }

    pub fn organization(&self, org_id: &str) -> Option<FullOrganization> {
        self.organizations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.organization.id == org_id)
            .cloned()
    }

    pub fn api_key(&self, key_id: &str) -> Option<ApiKey> {
        self.api_keys.lock().unwrap().values().find(|k| k.id == key_id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == user_id).cloned()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn signed_in(&self, headers: &RequestHeaders) -> AppResult<User> {
        headers
            .bearer_token()
            .and_then(|token| self.user(token))
            .ok_or_else(|| AppError::upstream(401, "no active session"))
    }

    fn with_org<T, F>(&self, org_id: &str, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut FullOrganization) -> AppResult<T>,
    {
        let mut orgs = self.organizations.lock().unwrap();
        let org = orgs
            .iter_mut()
            .find(|o| o.organization.id == org_id)
            .ok_or_else(|| AppError::upstream(404, "organization not found"))?;
        f(org)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failing(&self, user_id: &str) -> AppResult<()> {
        if self.failing.contains(user_id) {
            return Err(AppError::upstream(500, format!("backend refused {user_id}")));
        }
        Ok(())
    }

    fn update<F: FnOnce(&mut User)>(&self, user_id: &str, f: F) -> AppResult<User> {
        self.check_failing(user_id)?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::upstream(404, "user not found"))?;
        f(user);
        Ok(user.clone())
    }
}

pub fn organization(slug: &str) -> Organization {
    Organization {
        id: format!("org-{slug}"),
        name: slug.to_string(),
        slug: slug.to_string(),
        logo: None,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

#[async_trait]
impl SessionBackend for FakeAuthBackend {
    async fn get_session(&self, headers: &RequestHeaders) -> AppResult<Option<SessionWithUser>> {
        let Some(token) = headers.bearer_token() else {
            return Ok(None);
        };
        Ok(self.user(token).map(|user| SessionWithUser {
            session: session_for(&user),
            user,
        }))
    }

    async fn list_sessions(&self, headers: &RequestHeaders) -> AppResult<Vec<Session>> {
        Ok(self
            .get_session(headers)
            .await?
            .map(|current| vec![current.session])
            .unwrap_or_default())
    }

    async fn revoke_session(&self, _headers: &RequestHeaders, token: &str) -> AppResult<()> {
        self.record(format!("revoke_session:{token}"));
        Ok(())
    }

    async fn revoke_other_sessions(&self, _headers: &RequestHeaders) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AdminBackend for FakeAuthBackend {
    async fn list_users(&self, _headers: &RequestHeaders, _query: &ListUsersQuery) -> AppResult<UserList> {
        let users = self.users.lock().unwrap().clone();
        Ok(UserList {
            total: users.len() as u64,
            users,
            limit: None,
            offset: None,
        })
    }

    async fn get_user(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<User> {
        self.user(user_id)
            .ok_or_else(|| AppError::upstream(404, "user not found"))
    }

    async fn create_user(&self, _headers: &RequestHeaders, req: &CreateUserRequest) -> AppResult<User> {
        let id = format!("u{}", self.users.lock().unwrap().len() + 1);
        let created = user(&id, &req.name, req.role.as_deref());
        self.users.lock().unwrap().push(created.clone());
        self.record(format!("create_user:{id}"));
        Ok(created)
    }

    async fn update_user(&self, _headers: &RequestHeaders, user_id: &str, req: &UpdateUserRequest) -> AppResult<User> {
        self.update(user_id, |u| {
            if let Some(name) = &req.name {
                u.name = name.clone();
            }
        })
    }

    async fn ban_user(&self, _headers: &RequestHeaders, user_id: &str, req: &BanUserRequest) -> AppResult<User> {
        self.record(format!("ban_user:{user_id}"));
        self.update(user_id, |u| {
            u.banned = Some(true);
            u.ban_reason = req.ban_reason.clone();
        })
    }

    async fn unban_user(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<User> {
        self.record(format!("unban_user:{user_id}"));
        self.update(user_id, |u| {
            u.banned = Some(false);
            u.ban_reason = None;
        })
    }

    async fn set_role(&self, _headers: &RequestHeaders, user_id: &str, role: &str) -> AppResult<User> {
        self.record(format!("set_role:{user_id}:{role}"));
        self.update(user_id, |u| u.role = Some(role.to_string()))
    }

    async fn set_user_password(&self, _headers: &RequestHeaders, user_id: &str, _new_password: &str) -> AppResult<()> {
        self.check_failing(user_id)
    }

    async fn list_user_sessions(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<Vec<Session>> {
        Ok(self.user(user_id).map(|u| vec![session_for(&u)]).unwrap_or_default())
    }

    async fn revoke_user_session(&self, _headers: &RequestHeaders, session_token: &str) -> AppResult<()> {
        self.record(format!("revoke_user_session:{session_token}"));
        Ok(())
    }

    async fn revoke_user_sessions(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<()> {
        self.record(format!("revoke_user_sessions:{user_id}"));
        self.check_failing(user_id)
    }

    async fn remove_user(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<()> {
        self.record(format!("remove_user:{user_id}"));
        self.check_failing(user_id)?;
        self.users.lock().unwrap().retain(|u| u.id != user_id);
        Ok(())
    }

    async fn impersonate_user(&self, _headers: &RequestHeaders, user_id: &str) -> AppResult<SessionWithUser> {
        let user = self
            .user(user_id)
            .ok_or_else(|| AppError::upstream(404, "user not found"))?;
        Ok(SessionWithUser {
            session: session_for(&user),
            user,
        })
    }
}

#[async_trait]
impl OrganizationBackend for FakeAuthBackend {
    async fn create_organization(
        &self,
        _headers: &RequestHeaders,
        req: &CreateOrganizationRequest,
    ) -> AppResult<Organization> {
        self.record(format!("create_organization:{}", req.slug));
        let mut orgs = self.organizations.lock().unwrap();
        if orgs.iter().any(|o| o.organization.slug == req.slug) {
            return Err(AppError::upstream(400, "organization slug already taken"));
        }
        let created = Organization {
            name: req.name.clone(),
            logo: req.logo.clone(),
            ..organization(&req.slug)
        };
        orgs.push(FullOrganization {
            organization: created.clone(),
            members: Vec::new(),
            invitations: Vec::new(),
            teams: Vec::new(),
        });
        Ok(created)
    }

    async fn list_organizations(&self, _headers: &RequestHeaders) -> AppResult<Vec<Organization>> {
        Ok(self
            .organizations
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.organization.clone())
            .collect())
    }

    async fn get_full_organization(&self, _headers: &RequestHeaders, org_id: &str) -> AppResult<FullOrganization> {
        self.organization(org_id)
            .ok_or_else(|| AppError::upstream(404, "organization not found"))
    }

    async fn update_organization(
        &self,
        _headers: &RequestHeaders,
        org_id: &str,
        req: &UpdateOrganizationRequest,
    ) -> AppResult<Organization> {
        self.record(format!("update_organization:{org_id}"));
        self.with_org(org_id, |org| {
            let target = &mut org.organization;
            if let Some(name) = &req.name {
                target.name = name.clone();
            }
            if let Some(slug) = &req.slug {
                target.slug = slug.clone();
            }
            if req.logo.is_some() {
                target.logo = req.logo.clone();
            }
            Ok(target.clone())
        })
    }

    async fn delete_organization(&self, _headers: &RequestHeaders, org_id: &str) -> AppResult<()> {
        self.record(format!("delete_organization:{org_id}"));
        let mut orgs = self.organizations.lock().unwrap();
        let before = orgs.len();
        orgs.retain(|o| o.organization.id != org_id);
        if orgs.len() == before {
            return Err(AppError::upstream(404, "organization not found"));
        }
        Ok(())
    }

    async fn add_member(&self, _headers: &RequestHeaders, org_id: &str, req: &AddMemberRequest) -> AppResult<Member> {
        self.record(format!("add_member:{org_id}:{}", req.user_id));
        let id = self.next_id("member");
        self.with_org(org_id, |org| {
            let member = Member {
                id,
                organization_id: org_id.to_string(),
                user_id: req.user_id.clone(),
                role: req.role.clone(),
                created_at: Utc::now(),
                team_id: req.team_id.clone(),
            };
            org.members.push(member.clone());
            Ok(member)
        })
    }

    async fn remove_member(&self, _headers: &RequestHeaders, org_id: &str, member: &str) -> AppResult<()> {
        self.record(format!("remove_member:{org_id}:{member}"));
        let email_owner = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == member)
            .map(|u| u.id.clone());
        self.with_org(org_id, |org| {
            let before = org.members.len();
            org.members
                .retain(|m| m.id != member && Some(&m.user_id) != email_owner.as_ref());
            if org.members.len() == before {
                return Err(AppError::upstream(404, "member not found"));
            }
            Ok(())
        })
    }

    async fn update_member_role(
        &self,
        _headers: &RequestHeaders,
        org_id: &str,
        member_id: &str,
        role: &str,
    ) -> AppResult<Member> {
        self.record(format!("update_member_role:{member_id}:{role}"));
        self.with_org(org_id, |org| {
            let member = org
                .members
                .iter_mut()
                .find(|m| m.id == member_id)
                .ok_or_else(|| AppError::upstream(404, "member not found"))?;
            member.role = role.to_string();
            Ok(member.clone())
        })
    }

    async fn list_members(&self, _headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Member>> {
        self.with_org(org_id, |org| Ok(org.members.clone()))
    }

    async fn create_invitation(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        req: &InviteMemberRequest,
    ) -> AppResult<Invitation> {
        self.record(format!("create_invitation:{org_id}:{}", req.email));
        let inviter = headers.bearer_token().map(str::to_string);
        let id = self.next_id("invitation");
        self.with_org(org_id, |org| {
            let invitation = Invitation {
                id,
                organization_id: org_id.to_string(),
                email: req.email.clone(),
                role: req.role.clone(),
                status: "pending".to_string(),
                expires_at: Utc::now() + Duration::hours(48),
                inviter_id: inviter,
                team_id: req.team_id.clone(),
            };
            org.invitations.push(invitation.clone());
            Ok(invitation)
        })
    }

    async fn cancel_invitation(&self, _headers: &RequestHeaders, invitation_id: &str) -> AppResult<()> {
        self.record(format!("cancel_invitation:{invitation_id}"));
        let mut orgs = self.organizations.lock().unwrap();
        let invitation = orgs
            .iter_mut()
            .flat_map(|o| o.invitations.iter_mut())
            .find(|i| i.id == invitation_id)
            .ok_or_else(|| AppError::upstream(404, "invitation not found"))?;
        invitation.status = "canceled".to_string();
        Ok(())
    }

    async fn list_invitations(&self, _headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Invitation>> {
        self.with_org(org_id, |org| Ok(org.invitations.clone()))
    }

    async fn create_team(&self, _headers: &RequestHeaders, org_id: &str, name: &str) -> AppResult<Team> {
        self.record(format!("create_team:{org_id}:{name}"));
        let id = self.next_id("team");
        self.with_org(org_id, |org| {
            let team = Team {
                id,
                name: name.to_string(),
                organization_id: org_id.to_string(),
                created_at: Utc::now(),
            };
            org.teams.push(team.clone());
            Ok(team)
        })
    }

    async fn remove_team(&self, _headers: &RequestHeaders, org_id: &str, team_id: &str) -> AppResult<()> {
        self.record(format!("remove_team:{org_id}:{team_id}"));
        self.with_org(org_id, |org| {
            let before = org.teams.len();
            org.teams.retain(|t| t.id != team_id);
            if org.teams.len() == before {
                return Err(AppError::upstream(404, "team not found"));
            }
            Ok(())
        })
    }

    async fn list_teams(&self, _headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Team>> {
        self.with_org(org_id, |org| Ok(org.teams.clone()))
    }
}

#[async_trait]
impl ApiKeyBackend for FakeAuthBackend {
    async fn create_api_key(&self, headers: &RequestHeaders, req: &CreateApiKeyRequest) -> AppResult<CreatedApiKey> {
        let owner = match &req.user_id {
            Some(owner) => owner.clone(),
            None => self.signed_in(headers)?.id,
        };
        let id = self.next_id("key");
        let key = format!("{}{id}", req.prefix.as_deref().unwrap_or("ak_"));
        self.record(format!("create_api_key:{owner}"));
        let api_key = ApiKey {
            id,
            name: req.name.clone(),
            prefix: req.prefix.clone(),
            start: Some(key.chars().take(4).collect()),
            user_id: owner,
            enabled: true,
            expires_at: req.expires_in.map(|secs| Utc::now() + Duration::seconds(secs as i64)),
            permissions: req.permissions.clone(),
            created_at: Utc::now(),
        };
        self.api_keys.lock().unwrap().insert(key.clone(), api_key.clone());
        Ok(CreatedApiKey { api_key, key })
    }

    async fn list_api_keys(&self, _headers: &RequestHeaders) -> AppResult<Vec<ApiKey>> {
        Ok(self.api_keys.lock().unwrap().values().cloned().collect())
    }

    async fn update_api_key(
        &self,
        _headers: &RequestHeaders,
        key_id: &str,
        req: &UpdateApiKeyRequest,
    ) -> AppResult<ApiKey> {
        self.record(format!("update_api_key:{key_id}"));
        let mut keys = self.api_keys.lock().unwrap();
        let key = keys
            .values_mut()
            .find(|k| k.id == key_id)
            .ok_or_else(|| AppError::upstream(404, "api key not found"))?;
        if let Some(name) = &req.name {
            key.name = Some(name.clone());
        }
        if let Some(enabled) = req.enabled {
            key.enabled = enabled;
        }
        if req.permissions.is_some() {
            key.permissions = req.permissions.clone();
        }
        Ok(key.clone())
    }

    async fn delete_api_key(&self, _headers: &RequestHeaders, key_id: &str) -> AppResult<()> {
        self.record(format!("delete_api_key:{key_id}"));
        let mut keys = self.api_keys.lock().unwrap();
        let before = keys.len();
        keys.retain(|_, k| k.id != key_id);
        if keys.len() == before {
            return Err(AppError::upstream(404, "api key not found"));
        }
        Ok(())
    }

    async fn verify_api_key(&self, key: &str, _permissions: Option<&Scopes>) -> AppResult<ApiKeyVerification> {
        Ok(match self.api_keys.lock().unwrap().get(key) {
            Some(found) if found.enabled => ApiKeyVerification {
                valid: true,
                key: Some(found.clone()),
                error: None,
            },
            _ => ApiKeyVerification {
                valid: false,
                key: None,
                error: Some(json!({ "code": "INVALID_API_KEY" })),
            },
        })
    }
}

#[async_trait]
impl EmailPasswordBackend for FakeAuthBackend {
    async fn sign_up_email(&self, _headers: &RequestHeaders, req: &SignUpRequest) -> AppResult<AuthResponse> {
        self.record(format!("sign_up:{}", req.email));
        if self.users.lock().unwrap().iter().any(|u| u.email == req.email) {
            return Err(AppError::upstream(422, "user already exists"));
        }
        let id = self.next_id("user");
        let created = User {
            email: req.email.clone(),
            ..user(&id, &req.name, None)
        };
        self.users.lock().unwrap().push(created.clone());
        self.passwords
            .lock()
            .unwrap()
            .insert(req.email.clone(), req.password.clone());
        Ok(AuthResponse {
            token: Some(id),
            user: created,
        })
    }

    async fn sign_in_email(&self, _headers: &RequestHeaders, req: &SignInRequest) -> AppResult<AuthResponse> {
        self.record(format!("sign_in:{}", req.email));
        let matches = self.passwords.lock().unwrap().get(&req.email) == Some(&req.password);
        let found = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == req.email)
            .cloned();
        match found {
            Some(user) if matches => Ok(AuthResponse {
                token: Some(user.id.clone()),
                user,
            }),
            _ => Err(AppError::upstream(401, "invalid email or password")),
        }
    }

    async fn sign_out(&self, headers: &RequestHeaders) -> AppResult<()> {
        let user = self.signed_in(headers)?;
        self.record(format!("sign_out:{}", user.id));
        Ok(())
    }

    async fn change_password(&self, headers: &RequestHeaders, req: &ChangePasswordRequest) -> AppResult<()> {
        let user = self.signed_in(headers)?;
        self.record(format!("change_password:{}", user.id));
        let mut passwords = self.passwords.lock().unwrap();
        if let Some(current) = passwords.get(&user.email) {
            if current != &req.current_password {
                return Err(AppError::upstream(400, "invalid password"));
            }
        }
        passwords.insert(user.email, req.new_password.clone());
        Ok(())
    }
}

pub fn test_config(api_url: &str) -> AppConfig {
    AppConfig {
        database_url: None,
        auth_secret: "test-secret-that-is-long-enough-for-tests".to_string(),
        auth_url: "http://auth.invalid".to_string(),
        api_url: api_url.to_string(),
        port: 3001,
    }
}

pub fn test_app(backend: Arc<FakeAuthBackend>) -> Router {
    test_app_with_api(backend, "http://api.invalid")
}

pub fn test_app_with_api(backend: Arc<FakeAuthBackend>, api_url: &str) -> Router {
    let state = AppState::with_backend(test_config(api_url), None, backend);
    create_app(state)
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

/// Sends one request; `token` becomes a bearer header.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}
