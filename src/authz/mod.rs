//! Authorization: permission model, role table and evaluator.
//!
//! A request is allowed when:
//! - the API key used for it is scoped for the (resource, action) pair, or
//! - the user holds the admin role, or
//! - the user's role lists the pair in the role table.

mod evaluator;
pub mod permission;
mod principal;
pub mod roles;
mod store;

pub use evaluator::{Decision, DefaultPermissionEvaluator, DenyReason, PermissionEvaluator};
pub use permission::{permission_key, Action, Permission, Resource, Scopes};
pub use principal::Subject;
pub use store::{default_table, Grants, InMemoryRoleRepository, RoleRepository};

use crate::errors::{AppError, AppResult};

/// Runs the evaluator and turns a deny into a request error (401 or 403).
pub async fn ensure_permitted(
    evaluator: &dyn PermissionEvaluator,
    subject: &Subject,
    resource: Resource,
    action: Action,
) -> AppResult<()> {
    match evaluator.check(subject, &resource, &action).await {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::info!(
                user_id = subject.user_id.as_deref().unwrap_or("-"),
                permission = %permission_key(&resource, &action),
                reason = reason.code(),
                "request denied"
            );
            Err(deny_error(reason))
        }
    }
}

pub fn deny_error(reason: DenyReason) -> AppError {
    match reason {
        DenyReason::Unauthorized => AppError::unauthorized(reason.code()),
        DenyReason::InsufficientPermissions => AppError::forbidden(reason.code()),
    }
}
