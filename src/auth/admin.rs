use std::sync::Arc;

use serde_json::json;

use super::backend::AdminBackend;
use super::instrument::instrument;
use super::AuthContext;
use crate::authz::{ensure_permitted, roles, Action, PermissionEvaluator, Resource};
use crate::errors::AppResult;
use crate::models::session::{Session, SessionWithUser};
use crate::models::user::{BanUserRequest, CreateUserRequest, ListUsersQuery, UpdateUserRequest, User, UserList};

/// User administration, guarded by the `user` and `session` grants.
#[derive(Clone)]
pub struct AdminService {
    backend: Arc<dyn AdminBackend>,
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl AdminService {
    pub fn new(backend: Arc<dyn AdminBackend>, evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { backend, evaluator }
    }

    /// Checks one grant for the caller without calling the backend.
    pub async fn authorize(&self, ctx: &AuthContext, resource: Resource, action: Action) -> AppResult<()> {
        ensure_permitted(self.evaluator.as_ref(), &ctx.subject, resource, action).await
    }

    pub async fn list_users(&self, ctx: &AuthContext, query: &ListUsersQuery) -> AppResult<UserList> {
        self.authorize(ctx, Resource::User, Action::List).await?;
        instrument("admin.listUsers", json!(query), self.backend.list_users(&ctx.headers, query)).await
    }

    pub async fn get_user(&self, ctx: &AuthContext, user_id: &str) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::Get).await?;
        instrument(
            "admin.getUser",
            json!({ "userId": user_id }),
            self.backend.get_user(&ctx.headers, user_id),
        )
        .await
    }

    pub async fn create_user(&self, ctx: &AuthContext, req: &CreateUserRequest) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::Create).await?;
        if let Some(role) = &req.role {
            roles::validate_assignable(role)?;
        }
        instrument("admin.createUser", json!(req), self.backend.create_user(&ctx.headers, req)).await
    }

    pub async fn update_user(&self, ctx: &AuthContext, user_id: &str, req: &UpdateUserRequest) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::Update).await?;
        instrument(
            "admin.updateUser",
            json!({ "userId": user_id, "data": req }),
            self.backend.update_user(&ctx.headers, user_id, req),
        )
        .await
    }

    pub async fn ban_user(&self, ctx: &AuthContext, user_id: &str, req: &BanUserRequest) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::Ban).await?;
        instrument(
            "admin.banUser",
            json!({ "userId": user_id, "banReason": req.ban_reason, "banExpiresIn": req.ban_expires_in }),
            self.backend.ban_user(&ctx.headers, user_id, req),
        )
        .await
    }

    pub async fn unban_user(&self, ctx: &AuthContext, user_id: &str) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::Ban).await?;
        instrument(
            "admin.unbanUser",
            json!({ "userId": user_id }),
            self.backend.unban_user(&ctx.headers, user_id),
        )
        .await
    }

    /// Only roles from [`roles::ASSIGNABLE_ROLES`] can be set.
    pub async fn set_role(&self, ctx: &AuthContext, user_id: &str, role: &str) -> AppResult<User> {
        self.authorize(ctx, Resource::User, Action::SetRole).await?;
        let role = roles::validate_assignable(role)?;
        instrument(
            "admin.setRole",
            json!({ "userId": user_id, "role": role }),
            self.backend.set_role(&ctx.headers, user_id, role),
        )
        .await
    }

    pub async fn set_user_password(&self, ctx: &AuthContext, user_id: &str, new_password: &str) -> AppResult<()> {
        self.authorize(ctx, Resource::User, Action::SetPassword).await?;
        instrument(
            "admin.setUserPassword",
            json!({ "userId": user_id, "newPassword": new_password }),
            self.backend.set_user_password(&ctx.headers, user_id, new_password),
        )
        .await
    }

    pub async fn list_user_sessions(&self, ctx: &AuthContext, user_id: &str) -> AppResult<Vec<Session>> {
        self.authorize(ctx, Resource::Session, Action::List).await?;
        instrument(
            "admin.listUserSessions",
            json!({ "userId": user_id }),
            self.backend.list_user_sessions(&ctx.headers, user_id),
        )
        .await
    }

    pub async fn revoke_user_session(&self, ctx: &AuthContext, session_token: &str) -> AppResult<()> {
        self.authorize(ctx, Resource::Session, Action::Revoke).await?;
        instrument(
            "admin.revokeUserSession",
            json!({ "sessionToken": session_token }),
            self.backend.revoke_user_session(&ctx.headers, session_token),
        )
        .await
    }

    pub async fn revoke_user_sessions(&self, ctx: &AuthContext, user_id: &str) -> AppResult<()> {
        self.authorize(ctx, Resource::Session, Action::Revoke).await?;
        instrument(
            "admin.revokeUserSessions",
            json!({ "userId": user_id }),
            self.backend.revoke_user_sessions(&ctx.headers, user_id),
        )
        .await
    }

    pub async fn remove_user(&self, ctx: &AuthContext, user_id: &str) -> AppResult<()> {
        self.authorize(ctx, Resource::User, Action::Delete).await?;
        instrument(
            "admin.removeUser",
            json!({ "userId": user_id }),
            self.backend.remove_user(&ctx.headers, user_id),
        )
        .await
    }

    pub async fn impersonate_user(&self, ctx: &AuthContext, user_id: &str) -> AppResult<SessionWithUser> {
        self.authorize(ctx, Resource::User, Action::Impersonate).await?;
        instrument(
            "admin.impersonateUser",
            json!({ "userId": user_id }),
            self.backend.impersonate_user(&ctx.headers, user_id),
        )
        .await
    }
}
