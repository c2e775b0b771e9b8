//! Seams to the external auth service, one trait per feature area.

use async_trait::async_trait;

use super::RequestHeaders;
use crate::authz::Scopes;
use crate::errors::AppResult;
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

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// `None` when the headers carry no live session.
    async fn get_session(&self, headers: &RequestHeaders) -> AppResult<Option<SessionWithUser>>;
    async fn list_sessions(&self, headers: &RequestHeaders) -> AppResult<Vec<Session>>;
    async fn revoke_session(&self, headers: &RequestHeaders, token: &str) -> AppResult<()>;
    async fn revoke_other_sessions(&self, headers: &RequestHeaders) -> AppResult<()>;
}

#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn list_users(&self, headers: &RequestHeaders, query: &ListUsersQuery) -> AppResult<UserList>;
    async fn get_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<User>;
    async fn create_user(&self, headers: &RequestHeaders, req: &CreateUserRequest) -> AppResult<User>;
    async fn update_user(
        &self,
        headers: &RequestHeaders,
        user_id: &str,
        req: &UpdateUserRequest,
    ) -> AppResult<User>;
    async fn ban_user(&self, headers: &RequestHeaders, user_id: &str, req: &BanUserRequest) -> AppResult<User>;
    async fn unban_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<User>;
    async fn set_role(&self, headers: &RequestHeaders, user_id: &str, role: &str) -> AppResult<User>;
    async fn set_user_password(&self, headers: &RequestHeaders, user_id: &str, new_password: &str) -> AppResult<()>;
    async fn list_user_sessions(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<Vec<Session>>;
    async fn revoke_user_session(&self, headers: &RequestHeaders, session_token: &str) -> AppResult<()>;
    async fn revoke_user_sessions(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<()>;
    async fn remove_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<()>;
    async fn impersonate_user(&self, headers: &RequestHeaders, user_id: &str) -> AppResult<SessionWithUser>;
}

#[async_trait]
pub trait OrganizationBackend: Send + Sync {
    async fn create_organization(
        &self,
        headers: &RequestHeaders,
        req: &CreateOrganizationRequest,
    ) -> AppResult<Organization>;
    async fn list_organizations(&self, headers: &RequestHeaders) -> AppResult<Vec<Organization>>;
    async fn get_full_organization(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<FullOrganization>;
    async fn update_organization(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        req: &UpdateOrganizationRequest,
    ) -> AppResult<Organization>;
    async fn delete_organization(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<()>;
    async fn add_member(&self, headers: &RequestHeaders, org_id: &str, req: &AddMemberRequest) -> AppResult<Member>;
    async fn remove_member(&self, headers: &RequestHeaders, org_id: &str, member_id_or_email: &str) -> AppResult<()>;
    async fn update_member_role(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        member_id: &str,
        role: &str,
    ) -> AppResult<Member>;
    async fn list_members(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Member>>;
    async fn create_invitation(
        &self,
        headers: &RequestHeaders,
        org_id: &str,
        req: &InviteMemberRequest,
    ) -> AppResult<Invitation>;
    async fn cancel_invitation(&self, headers: &RequestHeaders, invitation_id: &str) -> AppResult<()>;
    async fn list_invitations(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Invitation>>;
    async fn create_team(&self, headers: &RequestHeaders, org_id: &str, name: &str) -> AppResult<Team>;
    async fn remove_team(&self, headers: &RequestHeaders, org_id: &str, team_id: &str) -> AppResult<()>;
    async fn list_teams(&self, headers: &RequestHeaders, org_id: &str) -> AppResult<Vec<Team>>;
}

#[async_trait]
pub trait ApiKeyBackend: Send + Sync {
    async fn create_api_key(&self, headers: &RequestHeaders, req: &CreateApiKeyRequest) -> AppResult<CreatedApiKey>;
    async fn list_api_keys(&self, headers: &RequestHeaders) -> AppResult<Vec<ApiKey>>;
    async fn update_api_key(
        &self,
        headers: &RequestHeaders,
        key_id: &str,
        req: &UpdateApiKeyRequest,
    ) -> AppResult<ApiKey>;
    async fn delete_api_key(&self, headers: &RequestHeaders, key_id: &str) -> AppResult<()>;
    async fn verify_api_key(&self, key: &str, permissions: Option<&Scopes>) -> AppResult<ApiKeyVerification>;
}

#[async_trait]
pub trait EmailPasswordBackend: Send + Sync {
    async fn sign_up_email(&self, headers: &RequestHeaders, req: &SignUpRequest) -> AppResult<AuthResponse>;
    async fn sign_in_email(&self, headers: &RequestHeaders, req: &SignInRequest) -> AppResult<AuthResponse>;
    async fn sign_out(&self, headers: &RequestHeaders) -> AppResult<()>;
    async fn change_password(&self, headers: &RequestHeaders, req: &ChangePasswordRequest) -> AppResult<()>;
}

/// Everything the console needs from the auth service.
pub trait AuthBackend:
    SessionBackend + AdminBackend + OrganizationBackend + ApiKeyBackend + EmailPasswordBackend
{
}

impl<T> AuthBackend for T where
    T: SessionBackend + AdminBackend + OrganizationBackend + ApiKeyBackend + EmailPasswordBackend
{
}
