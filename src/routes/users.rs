//! User administration endpoints.
//!
//! Every handler goes through [`AdminService`](crate::auth::AdminService), so the
//! caller's grants are checked before the auth service is contacted.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::errors::AppResult;
use crate::events::log_activity;
use crate::models::page::Page;
use crate::models::session::{RevokeSessionRequest, Session, SessionWithUser};
use crate::models::user::{
    BanUserRequest, CreateUserRequest, ListUsersQuery, SetPasswordRequest, SetRoleRequest, UpdateUserRequest, User,
};
use crate::users::{export_users, run_bulk, BulkOutcome, BulkRequest, BulkTarget, ExportFormat, UserFilter, UserStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/bulk", post(bulk_action))
        .route("/export", get(export))
        .route("/sessions/revoke", post(revoke_user_session))
        .route("/:id", get(get_user).patch(update_user).delete(remove_user))
        .route("/:id/ban", post(ban_user))
        .route("/:id/unban", post(unban_user))
        .route("/:id/role", post(set_role))
        .route("/:id/password", post(set_password))
        .route("/:id/sessions", get(list_user_sessions).delete(revoke_user_sessions))
        .route("/:id/impersonate", post(impersonate_user))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserListParams {
    fn filter(&self) -> UserFilter {
        UserFilter {
            search: self.search.clone(),
            role: self.role.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    #[serde(default)]
    pub format: ExportFormat,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
}

/// Whole user list; filtering and paging happen here rather than in the auth service.
async fn fetch_all(state: &AppState, ctx: &AuthContext) -> AppResult<Vec<User>> {
    let list = state.admin.list_users(ctx, &ListUsersQuery::default()).await?;
    Ok(list.users)
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Users",
    params(UserListParams),
    responses(
        (status = 200, description = "Filtered page of users", body = UserPage),
        (status = 403, description = "Missing user:list")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<Page<User>>> {
    let users = fetch_all(&state, &ctx).await?;
    let page = params
        .filter()
        .paginate(users, params.page.unwrap_or(1), params.page_size.unwrap_or(20));
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Role not assignable")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.admin.create_user(&ctx, &payload).await?;
    log_activity(&state.event_bus, "created", ctx.actor_id(), &user, &ctx.headers);
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "User", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn get_user(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<Json<User>> {
    Ok(Json(state.admin.get_user(&ctx, &id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.admin.update_user(&ctx, &id, &payload).await?;
    log_activity(&state.event_bus, "updated", ctx.actor_id(), &user, &ctx.headers);
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "User removed"),
        (status = 403, description = "Missing user:delete")
    ),
    security(("bearerAuth" = []))
)]
pub async fn remove_user(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<StatusCode> {
    // snapshot for the audit record; removal does not depend on it
    let snapshot = state.admin.get_user(&ctx, &id).await.ok();
    state.admin.remove_user(&ctx, &id).await?;
    if let Some(user) = snapshot {
        log_activity(&state.event_bus, "deleted", ctx.actor_id(), &user, &ctx.headers);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/ban",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = BanUserRequest,
    responses((status = 200, description = "Banned user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn ban_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(payload): Json<BanUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.admin.ban_user(&ctx, &id, &payload).await?;
    log_activity(&state.event_bus, "banned", ctx.actor_id(), &user, &ctx.headers);
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/unban",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Unbanned user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn unban_user(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> AppResult<Json<User>> {
    let user = state.admin.unban_user(&ctx, &id).await?;
    log_activity(&state.event_bus, "unbanned", ctx.actor_id(), &user, &ctx.headers);
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/role",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "User with the new role", body = User),
        (status = 400, description = "Role not assignable")
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(payload): Json<SetRoleRequest>,
) -> AppResult<Json<User>> {
    let user = state.admin.set_role(&ctx, &id, &payload.role).await?;
    log_activity(&state.event_bus, "role_changed", ctx.actor_id(), &user, &ctx.headers);
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/password",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = SetPasswordRequest,
    responses((status = 204, description = "Password replaced")),
    security(("bearerAuth" = []))
)]
pub async fn set_password(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(payload): Json<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    state.admin.set_user_password(&ctx, &id, &payload.new_password).await?;
    tracing::info!(user_id = %id, actor = ctx.actor_id().unwrap_or("-"), "password reset by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/sessions",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Sessions of the user", body = Vec<Session>)),
    security(("bearerAuth" = []))
)]
pub async fn list_user_sessions(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Session>>> {
    Ok(Json(state.admin.list_user_sessions(&ctx, &id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}/sessions",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 204, description = "All sessions revoked")),
    security(("bearerAuth" = []))
)]
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.admin.revoke_user_sessions(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/users/sessions/revoke",
    tag = "Users",
    request_body = RevokeSessionRequest,
    responses((status = 204, description = "Session revoked")),
    security(("bearerAuth" = []))
)]
pub async fn revoke_user_session(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<RevokeSessionRequest>,
) -> AppResult<StatusCode> {
    state.admin.revoke_user_session(&ctx, &payload.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/impersonate",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Impersonation session", body = SessionWithUser)),
    security(("bearerAuth" = []))
)]
pub async fn impersonate_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<Json<SessionWithUser>> {
    let session = state.admin.impersonate_user(&ctx, &id).await?;
    tracing::warn!(user_id = %id, actor = ctx.actor_id().unwrap_or("-"), "impersonation started");
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/bulk",
    tag = "Users",
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Per-user results; partial failure included", body = BulkOutcome),
        (status = 401, description = "No session or API key"),
        (status = 403, description = "Caller lacks the grant for this action"),
        (status = 502, description = "Every attempted operation failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn bulk_action(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<BulkRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let targets = payload.user_ids.into_iter().map(BulkTarget::new).collect();
    let outcome = run_bulk(&state.admin, &ctx, &payload.action, targets).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/export",
    tag = "Users",
    params(ExportParams),
    responses((status = 200, description = "CSV or JSON file of the filtered users", body = String)),
    security(("bearerAuth" = []))
)]
pub async fn export(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let filter = UserFilter {
        search: params.search,
        role: params.role,
        status: params.status,
    };
    let users = filter.apply(fetch_all(&state, &ctx).await?);
    let body = export_users(&users, params.format)?;

    let filename = format!(
        "users-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        params.format.extension()
    );
    let headers = [
        (header::CONTENT_TYPE, params.format.content_type().to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];
    Ok((headers, body).into_response())
}
