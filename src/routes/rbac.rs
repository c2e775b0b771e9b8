//! Role table editor and permission checks.
//!
//! Role replacements are published to the audit log with Critical severity.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{ensure_permitted, permission_key, roles, Action, Resource};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::models::rbac::*;

// =============================================================================
// ROUTER
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role).put(replace_role))
        .route("/assignable-roles", get(assignable_roles))
        // Evaluated for the caller
        .route("/check", get(check_permission))
}

// =============================================================================
// ROLE ENDPOINTS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/rbac/roles",
    tag = "RBAC",
    responses(
        (status = 200, description = "Role table", body = Vec<Role>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Missing role:list")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_roles(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<Role>>> {
    ensure_permitted(state.evaluator.as_ref(), &ctx.subject, Resource::Role, Action::List).await?;
    Ok(Json(state.roles.list().await?))
}

/// Role names are matched after trimming.
fn role_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("role name must not be empty"));
    }
    Ok(name.to_string())
}

#[utoipa::path(
    get,
    path = "/api/rbac/roles/{name}",
    tag = "RBAC",
    params(("name" = String, Path, description = "Role name")),
    responses(
        (status = 200, description = "Role with its permissions; unknown roles have none", body = Role),
        (status = 400, description = "Empty role name"),
        (status = 403, description = "Missing role:read")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(name): Path<String>,
) -> AppResult<Json<Role>> {
    ensure_permitted(state.evaluator.as_ref(), &ctx.subject, Resource::Role, Action::Read).await?;
    let name = role_name(&name)?;
    let permissions = state.roles.get(&name).await?;
    Ok(Json(Role { name, permissions }))
}

#[utoipa::path(
    put,
    path = "/api/rbac/roles/{name}",
    tag = "RBAC",
    params(("name" = String, Path, description = "Role name")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role after replacement", body = Role),
        (status = 400, description = "Empty role name"),
        (status = 403, description = "Missing role:update")
    ),
    security(("bearerAuth" = []))
)]
pub async fn replace_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(name): Path<String>,
    Json(payload): Json<RoleUpdateRequest>,
) -> AppResult<Json<Role>> {
    ensure_permitted(state.evaluator.as_ref(), &ctx.subject, Resource::Role, Action::Update).await?;

    let name = role_name(&name)?;

    let old = Role {
        permissions: state.roles.get(&name).await?,
        name: name.clone(),
    };
    let role = state.roles.replace(&name, payload.permissions).await?;

    tracing::info!(role = %role.name, permissions = role.permissions.len(), "role replaced");
    log_activity_with_context(
        &state.event_bus,
        "updated",
        ctx.actor_id(),
        &role,
        Some(&old),
        Some(RequestContext::from_headers(&ctx.headers)),
    );

    Ok(Json(role))
}

#[utoipa::path(
    get,
    path = "/api/rbac/assignable-roles",
    tag = "RBAC",
    responses((status = 200, description = "Roles an admin may assign", body = AssignableRolesResponse))
)]
pub async fn assignable_roles() -> Json<AssignableRolesResponse> {
    Json(AssignableRolesResponse {
        roles: roles::ASSIGNABLE_ROLES.iter().map(|r| r.to_string()).collect(),
        default_role: roles::DEFAULT_ROLE.to_string(),
    })
}

// =============================================================================
// PERMISSION CHECK (computed)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/rbac/check",
    tag = "RBAC",
    params(
        ("resource" = String, Query, description = "Resource name, e.g. user"),
        ("action" = String, Query, description = "Action name, e.g. ban")
    ),
    responses((status = 200, description = "Decision for the caller", body = PermissionCheckResponse))
)]
pub async fn check_permission(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<PermissionCheckQuery>,
) -> Json<PermissionCheckResponse> {
    let resource = Resource::from(query.resource.as_str());
    let action = Action::from(query.action.as_str());
    let decision = state.evaluator.check(&ctx.subject, &resource, &action).await;

    Json(PermissionCheckResponse {
        allowed: decision.is_allowed(),
        permission: permission_key(&resource, &action),
        reason: decision.deny_reason().map(|reason| reason.code().to_string()),
    })
}
