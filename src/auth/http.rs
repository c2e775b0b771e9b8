//! [`AuthBackend`](super::AuthBackend) over the auth service's REST endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::backend::{AdminBackend, ApiKeyBackend, EmailPasswordBackend, OrganizationBackend, SessionBackend};
use super::RequestHeaders;
use crate::authz::Scopes;
use crate::errors::{AppError, AppResult};
use crate::models::api_key::{
    ApiKey, ApiKeyVerification, CreateApiKeyRequest, CreatedApiKey, UpdateApiKeyRequest,
};
use crate::models::organization::{
    AddMemberRequest, CreateOrganizationRequest, FullOrganization, Invitation, InviteMemberRequest,
    Member, Organization, Team, UpdateOrganizationRequest,
};
use crate::models::session::{Session, SessionWithUser};
use crate::models::user::{
    AuthResponse, BanUserRequest, ChangePasswordRequest, CreateUserRequest, ListUsersQuery,
    SignInRequest, SignUpRequest, UpdateUserRequest, User, UserList,
};
use crate::proxy::{decode, read_response, ProxyError};

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct SessionsEnvelope {
    sessions: Vec<Session>,
}

#[derive(Deserialize)]
struct MembersEnvelope {
    members: Vec<Member>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationQuery<'a> {
    organization_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    /// `auth_url` is the service origin; endpoints live under `/api/auth`.
    pub fn new(auth_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), auth_url)
    }

    pub fn with_client(http: reqwest::Client, auth_url: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/api/auth", auth_url.trim_end_matches('/')),
        }
    }

    fn builder(&self, method: Method, path: &str, headers: &RequestHeaders) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> AppResult<Option<Value>> {
        let resp = builder.send().await.map_err(ProxyError::from)?;
        Ok(read_response(resp).await?)
    }

    fn require<T: DeserializeOwned>(path: &str, value: Option<Value>) -> AppResult<T> {
        let value = value.ok_or_else(|| ProxyError::Empty(path.to_string()))?;
        Ok(decode(value)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, headers: &RequestHeaders) -> AppResult<T> {
        let value = self.send(self.builder(Method::GET, path, headers)).await?;
        Self::require(path, value)
    }

    async fn get_with_query<T, Q>(&self, path: &str, headers: &RequestHeaders, query: &Q) -> AppResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let value = self
            .send(self.builder(Method::GET, path, headers).query(query))
            .await?;
        Self::require(path, value)
    }

    async fn post_raw(&self, path: &str, headers: &RequestHeaders, body: Value) -> AppResult<Option<Value>> {
        let builder = self
            .builder(Method::POST, path, headers)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(builder).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, headers: &RequestHeaders, body: Value) -> AppResult<T> {
        let value = self.post_raw(path, headers, body).await?;
        Self::require(path, value)
    }

    async fn post_unit(&self, path: &str, headers: &RequestHeaders, body: Value) -> AppResult<()> {
        self.post_raw(path, headers, body).await.map(|_| ())
    }
}

/// Serializes `req` and adds `extra` fields next to its own.
fn merged<T: Serialize>(req: &T, extra: Value) -> AppResult<Value> {
    let mut body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
    if let (Value::Object(body), Value::Object(extra)) = (&mut body, extra) {
        body.extend(extra);
    }
    Ok(body)
}

#[async_trait]
impl SessionBackend for HttpAuthBackend {
    async fn get_session(&self, headers: &RequestHeaders) -> AppResult<Option<SessionWithUser>> {
        // no session is answered with a `null` body
        match self.send(self.builder(Method::GET, "/get-session", headers)).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(decode(value)?)),
        }
    }

    async fn list_sessions(&self, headers: &RequestHeaders) -> AppResult<Vec<Session>> {
        self.get("/list-sessions", headers).await
    }

    async fn revoke_session(&self, headers: &RequestHeaders, token: &str) -> AppResult<()> {
        self.post_unit("/revoke-session", headers, json!({ "token": token })).await
    }

    async fn revoke_other_sessions(&self, headers: &RequestHeaders) -> AppResult<()> {
        self.post_unit("/revoke-other-sessions", headers, json!({})).await
    }
}

#[async_trait]
impl AdminBackend for HttpAuthBackend {
    async fn list_users(&self, headers: &RequestHeaders, query: &ListUsersQuery) -> AppResult<UserList> {
        self.get_with_query("/admin/list-users", headers, query).await
    }

    async fn get_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<User> {
        self.get_with_query("/admin/get-user", headers, &[("id", user_id)]).await
    }

    async fn create_user(&self, headers: &RequestHeaders, req: &CreateUserRequest) -> AppResult<User> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        let envelope: UserEnvelope = self.post("/admin/create-user", headers, body).await?;
        Ok(envelope.user)
    }

    async fn update_user(&self, headers: &RequestHeaders, user_id: &str, req: &UpdateUserRequest) -> AppResult<User> {
        self.post("/admin/update-user", headers, json!({ "userId": user_id, "data": req }))
            .await
    }

    async fn ban_user(&self, headers: &RequestHeaders, user_id: &str, req: &BanUserRequest) -> AppResult<User> {
        let body = merged(req, json!({ "userId": user_id }))?;
        let envelope: UserEnvelope = self.post("/admin/ban-user", headers, body).await?;
        Ok(envelope.user)
    }

    async fn unban_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<User> {
        let envelope: UserEnvelope = self
            .post("/admin/unban-user", headers, json!({ "userId": user_id }))
            .await?;
        Ok(envelope.user)
    }

    async fn set_role(&self, headers: &RequestHeaders, user_id: &str, role: &str) -> AppResult<User> {
        let envelope: UserEnvelope = self
            .post("/admin/set-role", headers, json!({ "userId": user_id, "role": role }))
            .await?;
        Ok(envelope.user)
    }

    async fn set_user_password(&self, headers: &RequestHeaders, user_id: &str, new_password: &str) -> AppResult<()> {
        self.post_unit(
            "/admin/set-user-password",
            headers,
            json!({ "userId": user_id, "newPassword": new_password }),
        )
        .await
    }

    async fn list_user_sessions(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<Vec<Session>> {
        let envelope: SessionsEnvelope = self
            .post("/admin/list-user-sessions", headers, json!({ "userId": user_id }))
            .await?;
        Ok(envelope.sessions)
    }

    async fn revoke_user_session(&self, headers: &RequestHeaders, session_token: &str) -> AppResult<()> {
        self.post_unit(
            "/admin/revoke-user-session",
            headers,
            json!({ "sessionToken": session_token }),
        )
        .await
    }

    async fn revoke_user_sessions(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<()> {
        self.post_unit("/admin/revoke-user-sessions", headers, json!({ "userId": user_id }))
            .await
    }

    async fn remove_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<()> {
        self.post_unit("/admin/remove-user", headers, json!({ "userId": user_id }))
            .await
    }

    async fn impersonate_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<SessionWithUser> {
        self.post("/admin/impersonate-user", headers, json!({ "userId": user_id }))
            .await
    }
}

#[async_trait]
impl OrganizationBackend for HttpAuthBackend {
    async fn create_organization(
        &self,
        headers: &RequestHeaders,
        req: &CreateOrganizationRequest,
    ) -> AppResult<Organization> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        self.post("/organization/create", headers, body).await
    }

    async fn list_organizations(&self, headers: &RequestHeaders) -> AppResult<Vec<Organization>> {
        self.get("/organization/list", headers).await
    }

    async fn get_full_organization(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<FullOrganization> {
        self.get_with_query(
            "/organization/get-full-organization",
            headers,
            &OrganizationQuery { organization_id: org_id },
        )
        .await
    }

    async fn update_organization(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        req: &UpdateOrganizationRequest,
    ) -> AppResult<Organization> {
        self.post(
            "/organization/update",
            headers,
            json!({ "organizationId": org_id, "data": req }),
        )
        .await
    }

    async fn delete_organization(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<()> {
        self.post_unit("/organization/delete", headers, json!({ "organizationId": org_id }))
            .await
    }

    async fn add_member(&self, headers: &RequestHeaders, org_id: &str, req: &AddMemberRequest) -> AppResult<Member> {
        let body = merged(req, json!({ "organizationId": org_id }))?;
        self.post("/organization/add-member", headers, body).await
    }

    async fn remove_member(&self, headers: &RequestHeaders, org_id: &str, member_id_or_email: &str) -> AppResult<()> {
        self.post_unit(
            "/organization/remove-member",
            headers,
            json!({ "organizationId": org_id, "memberIdOrEmail": member_id_or_email }),
        )
        .await
    }

    async fn update_member_role(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        member_id: &str,
        role: &str,
    ) -> AppResult<Member> {
        self.post(
            "/organization/update-member-role",
            headers,
            json!({ "organizationId": org_id, "memberId": member_id, "role": role }),
        )
        .await
    }

    async fn list_members(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Member>> {
        let envelope: MembersEnvelope = self
            .get_with_query(
                "/organization/list-members",
                headers,
                &OrganizationQuery { organization_id: org_id },
            )
            .await?;
        Ok(envelope.members)
    }

    async fn create_invitation(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        req: &InviteMemberRequest,
    ) -> AppResult<Invitation> {
        let body = merged(req, json!({ "organizationId": org_id }))?;
        self.post("/organization/invite-member", headers, body).await
    }

    async fn cancel_invitation(&self, headers: &RequestHeaders, invitation_id: &str) -> AppResult<()> {
        self.post_unit(
            "/organization/cancel-invitation",
            headers,
            json!({ "invitationId": invitation_id }),
        )
        .await
    }

    async fn list_invitations(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Invitation>> {
        self.get_with_query(
            "/organization/list-invitations",
            headers,
            &OrganizationQuery { organization_id: org_id },
        )
        .await
    }

    async fn create_team(&self, headers: &RequestHeaders, org_id: &str, name: &str) -> AppResult<Team> {
        self.post(
            "/organization/create-team",
            headers,
            json!({ "organizationId": org_id, "name": name }),
        )
        .await
    }

    async fn remove_team(&self, headers: &RequestHeaders, org_id: &str, team_id: &str) -> AppResult<()> {
        self.post_unit(
            "/organization/remove-team",
            headers,
            json!({ "organizationId": org_id, "teamId": team_id }),
        )
        .await
    }

    async fn list_teams(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Team>> {
        self.get_with_query(
            "/organization/list-teams",
            headers,
            &OrganizationQuery { organization_id: org_id },
        )
        .await
    }
}

#[async_trait]
impl ApiKeyBackend for HttpAuthBackend {
    async fn create_api_key(&self, headers: &RequestHeaders, req: &CreateApiKeyRequest) -> AppResult<CreatedApiKey> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        self.post("/api-key/create", headers, body).await
    }

    async fn list_api_keys(&self, headers: &RequestHeaders) -> AppResult<Vec<ApiKey>> {
        self.get("/api-key/list", headers).await
    }

    async fn update_api_key(&self, headers: &RequestHeaders, key_id: &str, req: &UpdateApiKeyRequest) -> AppResult<ApiKey> {
        let body = merged(req, json!({ "keyId": key_id }))?;
        self.post("/api-key/update", headers, body).await
    }

    async fn delete_api_key(&self, headers: &RequestHeaders, key_id: &str) -> AppResult<()> {
        self.post_unit("/api-key/delete", headers, json!({ "keyId": key_id }))
            .await
    }

    async fn verify_api_key(&self, key: &str, permissions: Option<&Scopes>) -> AppResult<ApiKeyVerification> {
        self.post(
            "/api-key/verify",
            &RequestHeaders::new(),
            json!({ "key": key, "permissions": permissions }),
        )
        .await
    }
}

#[async_trait]
impl EmailPasswordBackend for HttpAuthBackend {
    async fn sign_up_email(&self, headers: &RequestHeaders, req: &SignUpRequest) -> AppResult<AuthResponse> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        self.post("/sign-up/email", headers, body).await
    }

    async fn sign_in_email(&self, headers: &RequestHeaders, req: &SignInRequest) -> AppResult<AuthResponse> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        self.post("/sign-in/email", headers, body).await
    }

    async fn sign_out(&self, headers: &RequestHeaders) -> AppResult<()> {
        self.post_unit("/sign-out", headers, json!({})).await
    }

    async fn change_password(&self, headers: &RequestHeaders, req: &ChangePasswordRequest) -> AppResult<()> {
        let body = serde_json::to_value(req).map_err(|err| AppError::internal(err.to_string()))?;
        self.post_unit("/change-password", headers, body).await
    }
}
