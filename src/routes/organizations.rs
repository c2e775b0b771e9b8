use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::errors::AppResult;
use crate::models::organization::*;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route("/invitations/:invitation_id", delete(cancel_invitation))
        .route(
            "/:org_id",
            get(get_organization).patch(update_organization).delete(delete_organization),
        )
        .route("/:org_id/members", get(list_members).post(add_member))
        .route("/:org_id/members/:member", patch(update_member_role).delete(remove_member))
        .route("/:org_id/invitations", get(list_invitations).post(create_invitation))
        .route("/:org_id/teams", get(list_teams).post(create_team))
        .route("/:org_id/teams/:team_id", delete(remove_team))
}

#[utoipa::path(
    get,
    path = "/api/organizations",
    tag = "Organizations",
    responses((status = 200, description = "Organizations visible to the caller", body = Vec<Organization>)),
    security(("bearerAuth" = []))
)]
pub async fn list_organizations(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(state.organizations.list(&ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "Organizations",
    request_body = CreateOrganizationRequest,
    responses((status = 201, description = "Organization created", body = Organization)),
    security(("bearerAuth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateOrganizationRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    let org = state.organizations.create(&ctx, &payload).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

#[utoipa::path(
    get,
    path = "/api/organizations/{org_id}",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    responses((status = 200, description = "Organization with members, invitations and teams", body = FullOrganization)),
    security(("bearerAuth" = []))
)]
pub async fn get_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
) -> AppResult<Json<FullOrganization>> {
    Ok(Json(state.organizations.get_full(&ctx, &org_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/organizations/{org_id}",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = UpdateOrganizationRequest,
    responses((status = 200, description = "Updated organization", body = Organization)),
    security(("bearerAuth" = []))
)]
pub async fn update_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> AppResult<Json<Organization>> {
    Ok(Json(state.organizations.update(&ctx, &org_id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/organizations/{org_id}",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    responses((status = 204, description = "Organization deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
) -> AppResult<StatusCode> {
    state.organizations.delete(&ctx, &org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Members

#[utoipa::path(
    get,
    path = "/api/organizations/{org_id}/members",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    responses((status = 200, description = "Members", body = Vec<Member>)),
    security(("bearerAuth" = []))
)]
pub async fn list_members(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
) -> AppResult<Json<Vec<Member>>> {
    Ok(Json(state.organizations.list_members(&ctx, &org_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/organizations/{org_id}/members",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = AddMemberRequest,
    responses((status = 201, description = "Member added", body = Member)),
    security(("bearerAuth" = []))
)]
pub async fn add_member(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let member = state.organizations.add_member(&ctx, &org_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    patch,
    path = "/api/organizations/{org_id}/members/{member}",
    tag = "Organizations",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("member" = String, Path, description = "Member id")
    ),
    request_body = UpdateMemberRoleRequest,
    responses((status = 200, description = "Member with the new role", body = Member)),
    security(("bearerAuth" = []))
)]
pub async fn update_member_role(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((org_id, member)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> AppResult<Json<Member>> {
    let member = state
        .organizations
        .update_member_role(&ctx, &org_id, &member, &payload.role)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    delete,
    path = "/api/organizations/{org_id}/members/{member}",
    tag = "Organizations",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("member" = String, Path, description = "Member id or email")
    ),
    responses((status = 204, description = "Member removed")),
    security(("bearerAuth" = []))
)]
pub async fn remove_member(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((org_id, member)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.organizations.remove_member(&ctx, &org_id, &member).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Invitations

#[utoipa::path(
    get,
    path = "/api/organizations/{org_id}/invitations",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    responses((status = 200, description = "Invitations", body = Vec<Invitation>)),
    security(("bearerAuth" = []))
)]
pub async fn list_invitations(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
) -> AppResult<Json<Vec<Invitation>>> {
    Ok(Json(state.organizations.list_invitations(&ctx, &org_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/organizations/{org_id}/invitations",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = InviteMemberRequest,
    responses((status = 201, description = "Invitation sent", body = Invitation)),
    security(("bearerAuth" = []))
)]
pub async fn create_invitation(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
    Json(payload): Json<InviteMemberRequest>,
) -> AppResult<(StatusCode, Json<Invitation>)> {
    let invitation = state.organizations.create_invitation(&ctx, &org_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

#[utoipa::path(
    delete,
    path = "/api/organizations/invitations/{invitation_id}",
    tag = "Organizations",
    params(("invitation_id" = String, Path, description = "Invitation id")),
    responses((status = 204, description = "Invitation canceled")),
    security(("bearerAuth" = []))
)]
pub async fn cancel_invitation(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(invitation_id): Path<String>,
) -> AppResult<StatusCode> {
    state.organizations.cancel_invitation(&ctx, &invitation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Teams

#[utoipa::path(
    get,
    path = "/api/organizations/{org_id}/teams",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    responses((status = 200, description = "Teams", body = Vec<Team>)),
    security(("bearerAuth" = []))
)]
pub async fn list_teams(State(state): State<AppState>, ctx: AuthContext, Path(org_id): Path<String>) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(state.organizations.list_teams(&ctx, &org_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/organizations/{org_id}/teams",
    tag = "Organizations",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = CreateTeamRequest,
    responses((status = 201, description = "Team created", body = Team)),
    security(("bearerAuth" = []))
)]
pub async fn create_team(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<String>,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    let team = state.organizations.create_team(&ctx, &org_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    delete,
    path = "/api/organizations/{org_id}/teams/{team_id}",
    tag = "Organizations",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("team_id" = String, Path, description = "Team id")
    ),
    responses((status = 204, description = "Team removed")),
    security(("bearerAuth" = []))
)]
pub async fn remove_team(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((org_id, team_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.organizations.remove_team(&ctx, &org_id, &team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
