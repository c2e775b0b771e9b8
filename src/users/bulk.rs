use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use utoipa::ToSchema;

use crate::auth::{AdminService, AuthContext};
use crate::authz::{roles, Action, Resource};
use crate::errors::{AppError, AppResult};
use crate::models::user::BanUserRequest;

/// One operation applied to every selected user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkAction {
    Ban {
        #[serde(default)]
        reason: Option<String>,
        /// Seconds until the ban lifts
        #[serde(default)]
        expires_in: Option<u64>,
    },
    Unban,
    Delete,
    SetRole {
        role: String,
    },
    RevokeSessions,
}

impl BulkAction {
    pub fn name(&self) -> &'static str {
        match self {
            BulkAction::Ban { .. } => "ban",
            BulkAction::Unban => "unban",
            BulkAction::Delete => "delete",
            BulkAction::SetRole { .. } => "set_role",
            BulkAction::RevokeSessions => "revoke_sessions",
        }
    }

    /// The grant every target of this action is checked against.
    pub fn permission(&self) -> (Resource, Action) {
        match self {
            BulkAction::Ban { .. } | BulkAction::Unban => (Resource::User, Action::Ban),
            BulkAction::Delete => (Resource::User, Action::Delete),
            BulkAction::SetRole { .. } => (Resource::User, Action::SetRole),
            BulkAction::RevokeSessions => (Resource::Session, Action::Revoke),
        }
    }

    /// Admin accounts are left untouched by destructive actions.
    pub fn skips_admins(&self) -> bool {
        matches!(self, BulkAction::Ban { .. } | BulkAction::Delete)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub user_ids: Vec<String>,
    pub action: BulkAction,
}

/// A user to act on; `role` is looked up when not known by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTarget {
    pub user_id: String,
    pub role: Option<String>,
}

impl BulkTarget {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: None,
        }
    }

    pub fn with_role(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Some(role.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub user_id: String,
    pub message: String,
}

/// Settled result of a bulk run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Partial failure is still a result; only a run where nothing attempted succeeded is an error.
    pub fn into_result(self) -> AppResult<BulkOutcome> {
        if self.attempted() > 0 && self.succeeded.is_empty() {
            let first = self.failed.first().map(|f| f.message.as_str()).unwrap_or_default();
            return Err(AppError::upstream(
                502,
                format!("all {} operations failed: {first}", self.failed.len()),
            ));
        }
        Ok(self)
    }
}

enum Settled {
    Succeeded,
    Skipped,
    Failed(AppError),
}

/// A run where every attempt was refused reports the refusal itself, not a 502.
fn settle(outcome: BulkOutcome, first_error: Option<AppError>) -> AppResult<BulkOutcome> {
    if outcome.attempted() > 0 && outcome.succeeded.is_empty() {
        if let Some(err @ (AppError::Unauthorized(_) | AppError::Forbidden(_))) = first_error {
            return Err(err);
        }
    }
    outcome.into_result()
}

async fn apply_one(admin: &AdminService, ctx: &AuthContext, action: &BulkAction, target: &BulkTarget) -> AppResult<Settled> {
    let user_id = target.user_id.as_str();

    if action.skips_admins() {
        let role = match &target.role {
            Some(role) => role.clone(),
            None => admin.get_user(ctx, user_id).await?.role_or_default().to_string(),
        };
        if roles::is_admin_role(Some(role.as_str())) {
            return Ok(Settled::Skipped);
        }
    }

    match action {
        BulkAction::Ban { reason, expires_in } => {
            let req = BanUserRequest {
                ban_reason: reason.clone(),
                ban_expires_in: *expires_in,
            };
            admin.ban_user(ctx, user_id, &req).await?;
        }
        BulkAction::Unban => {
            admin.unban_user(ctx, user_id).await?;
        }
        BulkAction::Delete => admin.remove_user(ctx, user_id).await?,
        BulkAction::SetRole { role } => {
            admin.set_role(ctx, user_id, role).await?;
        }
        BulkAction::RevokeSessions => admin.revoke_user_sessions(ctx, user_id).await?,
    }
    Ok(Settled::Succeeded)
}

/// Runs `action` for every target concurrently and waits for all of them.
///
/// The caller's grant for the action is checked once up front; a denial
/// fails the whole request before any target is touched.
pub async fn run_bulk(
    admin: &AdminService,
    ctx: &AuthContext,
    action: &BulkAction,
    targets: Vec<BulkTarget>,
) -> AppResult<BulkOutcome> {
    let (resource, grant) = action.permission();
    admin.authorize(ctx, resource, grant).await?;

    let mut tasks = JoinSet::new();
    for (index, target) in targets.iter().cloned().enumerate() {
        let admin = admin.clone();
        let ctx = ctx.clone();
        let action = action.clone();
        tasks.spawn(async move {
            let settled = match apply_one(&admin, &ctx, &action, &target).await {
                Ok(settled) => settled,
                Err(err) => Settled::Failed(err),
            };
            (index, settled)
        });
    }

    let mut results: Vec<Option<Settled>> = targets.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, settled)) => results[index] = Some(settled),
            Err(err) => tracing::error!(error = %err, "bulk task aborted"),
        }
    }

    let mut outcome = BulkOutcome::default();
    let mut first_error = None;
    for (target, settled) in targets.into_iter().zip(results) {
        match settled {
            Some(Settled::Succeeded) => outcome.succeeded.push(target.user_id),
            Some(Settled::Skipped) => outcome.skipped.push(target.user_id),
            Some(Settled::Failed(err)) => {
                outcome.failed.push(BulkFailure {
                    user_id: target.user_id,
                    message: err.to_string(),
                });
                first_error.get_or_insert(err);
            }
            None => outcome.failed.push(BulkFailure {
                user_id: target.user_id,
                message: "task aborted".to_string(),
            }),
        }
    }

    tracing::info!(
        action = action.name(),
        succeeded = outcome.succeeded.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "bulk action finished"
    );
    settle(outcome, first_error)
}
