use std::sync::Arc;

use serde_json::json;

use super::backend::OrganizationBackend;
use super::instrument::instrument;
use super::AuthContext;
use crate::authz::{ensure_permitted, Action, PermissionEvaluator, Resource};
use crate::errors::AppResult;
use crate::models::organization::{
    AddMemberRequest, CreateOrganizationRequest, FullOrganization, Invitation, InviteMemberRequest,
    Member, Organization, Team, UpdateOrganizationRequest,
};

#[derive(Clone)]
pub struct OrganizationService {
    backend: Arc<dyn OrganizationBackend>,
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl OrganizationService {
    pub fn new(backend: Arc<dyn OrganizationBackend>, evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { backend, evaluator }
    }

    async fn guard(&self, ctx: &AuthContext, resource: Resource, action: Action) -> AppResult<()> {
        ensure_permitted(self.evaluator.as_ref(), &ctx.subject, resource, action).await
    }

    pub async fn create(&self, ctx: &AuthContext, req: &CreateOrganizationRequest) -> AppResult<Organization> {
        self.guard(ctx, Resource::Organization, Action::Create).await?;
        instrument(
            "organization.create",
            json!(req),
            self.backend.create_organization(&ctx.headers, req),
        )
        .await
    }

    pub async fn list(&self, ctx: &AuthContext) -> AppResult<Vec<Organization>> {
        self.guard(ctx, Resource::Organization, Action::Read).await?;
        instrument("organization.list", json!({}), self.backend.list_organizations(&ctx.headers)).await
    }

    pub async fn get_full(&self, ctx: &AuthContext, org_id: &str) -> AppResult<FullOrganization> {
        self.guard(ctx, Resource::Organization, Action::Read).await?;
        instrument(
            "organization.getFullOrganization",
            json!({ "organizationId": org_id }),
            self.backend.get_full_organization(&ctx.headers, org_id),
        )
        .await
    }

    pub async fn update(
        &self,
        ctx: &AuthContext,
        org_id: &str,
        req: &UpdateOrganizationRequest,
    ) -> AppResult<Organization> {
        self.guard(ctx, Resource::Organization, Action::Update).await?;
        instrument(
            "organization.update",
            json!({ "organizationId": org_id, "data": req }),
            self.backend.update_organization(&ctx.headers, org_id, req),
        )
        .await
    }

    pub async fn delete(&self, ctx: &AuthContext, org_id: &str) -> AppResult<()> {
        self.guard(ctx, Resource::Organization, Action::Delete).await?;
        instrument(
            "organization.delete",
            json!({ "organizationId": org_id }),
            self.backend.delete_organization(&ctx.headers, org_id),
        )
        .await
    }

    pub async fn add_member(&self, ctx: &AuthContext, org_id: &str, req: &AddMemberRequest) -> AppResult<Member> {
        self.guard(ctx, Resource::Member, Action::Create).await?;
        instrument(
            "organization.addMember",
            json!({ "organizationId": org_id, "data": req }),
            self.backend.add_member(&ctx.headers, org_id, req),
        )
        .await
    }

    pub async fn remove_member(&self, ctx: &AuthContext, org_id: &str, member_id_or_email: &str) -> AppResult<()> {
        self.guard(ctx, Resource::Member, Action::Delete).await?;
        instrument(
            "organization.removeMember",
            json!({ "organizationId": org_id, "memberIdOrEmail": member_id_or_email }),
            self.backend.remove_member(&ctx.headers, org_id, member_id_or_email),
        )
        .await
    }

    pub async fn update_member_role(
        &self,
        ctx: &AuthContext,
        org_id: &str,
        member_id: &str,
        role: &str,
    ) -> AppResult<Member> {
        self.guard(ctx, Resource::Member, Action::Update).await?;
        instrument(
            "organization.updateMemberRole",
            json!({ "organizationId": org_id, "memberId": member_id, "role": role }),
            self.backend.update_member_role(&ctx.headers, org_id, member_id, role),
        )
        .await
    }

    pub async fn list_members(&self, ctx: &AuthContext, org_id: &str) -> AppResult<Vec<Member>> {
        self.guard(ctx, Resource::Organization, Action::Read).await?;
        instrument(
            "organization.listMembers",
            json!({ "organizationId": org_id }),
            self.backend.list_members(&ctx.headers, org_id),
        )
        .await
    }

    pub async fn create_invitation(
        &self,
        ctx: &AuthContext,
        org_id: &str,
        req: &InviteMemberRequest,
    ) -> AppResult<Invitation> {
        self.guard(ctx, Resource::Invitation, Action::Create).await?;
        instrument(
            "organization.inviteMember",
            json!({ "organizationId": org_id, "data": req }),
            self.backend.create_invitation(&ctx.headers, org_id, req),
        )
        .await
    }

    pub async fn cancel_invitation(&self, ctx: &AuthContext, invitation_id: &str) -> AppResult<()> {
        self.guard(ctx, Resource::Invitation, Action::Cancel).await?;
        instrument(
            "organization.cancelInvitation",
            json!({ "invitationId": invitation_id }),
            self.backend.cancel_invitation(&ctx.headers, invitation_id),
        )
        .await
    }

    pub async fn list_invitations(&self, ctx: &AuthContext, org_id: &str) -> AppResult<Vec<Invitation>> {
        self.guard(ctx, Resource::Organization, Action::Read).await?;
        instrument(
            "organization.listInvitations",
            json!({ "organizationId": org_id }),
            self.backend.list_invitations(&ctx.headers, org_id),
        )
        .await
    }

    pub async fn create_team(&self, ctx: &AuthContext, org_id: &str, name: &str) -> AppResult<Team> {
        self.guard(ctx, Resource::Team, Action::Create).await?;
        instrument(
            "organization.createTeam",
            json!({ "organizationId": org_id, "name": name }),
            self.backend.create_team(&ctx.headers, org_id, name),
        )
        .await
    }

    pub async fn remove_team(&self, ctx: &AuthContext, org_id: &str, team_id: &str) -> AppResult<()> {
        self.guard(ctx, Resource::Team, Action::Delete).await?;
        instrument(
            "organization.removeTeam",
            json!({ "organizationId": org_id, "teamId": team_id }),
            self.backend.remove_team(&ctx.headers, org_id, team_id),
        )
        .await
    }

    pub async fn list_teams(&self, ctx: &AuthContext, org_id: &str) -> AppResult<Vec<Team>> {
        self.guard(ctx, Resource::Organization, Action::Read).await?;
        instrument(
            "organization.listTeams",
            json!({ "organizationId": org_id }),
            self.backend.list_teams(&ctx.headers, org_id),
        )
        .await
    }
}
