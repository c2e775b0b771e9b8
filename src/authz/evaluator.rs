use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::permission::{scopes_allow, Action, Permission, Resource};
use super::principal::Subject;
use super::store::RoleRepository;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// No usable identity (missing user id or role).
    Unauthorized,
    /// Identity present but the grant is missing.
    InsufficientPermissions,
}

impl DenyReason {
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::Unauthorized => "UNAUTHORIZED",
            DenyReason::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Pluggable authorization check. Never fails; a refusal is a [`Decision::Deny`].
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn check(&self, subject: &Subject, resource: &Resource, action: &Action) -> Decision;
}

/// Rule-table evaluator.
///
/// Evaluation order:
/// 1. API-key scopes, when present, decide alone
/// 2. missing identity -> UNAUTHORIZED
/// 3. admin role -> allow
/// 4. role table grant -> allow
/// 5. INSUFFICIENT_PERMISSIONS
#[derive(Clone)]
pub struct DefaultPermissionEvaluator {
    roles: Arc<dyn RoleRepository>,
}

impl DefaultPermissionEvaluator {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    fn granted(permissions: &[Permission], resource: &Resource, action: &Action) -> bool {
        permissions.iter().any(|perm| perm.matches(resource, action))
    }
}

#[async_trait]
impl PermissionEvaluator for DefaultPermissionEvaluator {
    async fn check(&self, subject: &Subject, resource: &Resource, action: &Action) -> Decision {
        if let Some(scopes) = &subject.api_key_scopes {
            let allowed = scopes_allow(scopes, resource, action);
            tracing::debug!(%resource, %action, allowed, "api key scope check");
            return if allowed {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::InsufficientPermissions)
            };
        }

        let Some((user_id, role)) = subject.identity() else {
            tracing::debug!(%resource, %action, "no identity");
            return Decision::Deny(DenyReason::Unauthorized);
        };

        if subject.is_admin() {
            tracing::debug!(user_id, %resource, %action, "admin bypass");
            return Decision::Allow;
        }

        let permissions = match self.roles.get(role).await {
            Ok(permissions) => permissions,
            Err(err) => {
                tracing::warn!(user_id, role, error = %err, "role lookup failed");
                Vec::new()
            }
        };

        if Self::granted(&permissions, resource, action) {
            tracing::debug!(user_id, role, %resource, %action, "role grant match");
            Decision::Allow
        } else {
            tracing::debug!(user_id, role, %resource, %action, "permission denied");
            Decision::Deny(DenyReason::InsufficientPermissions)
        }
    }
}
