use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::Permission;
use crate::events::{Loggable, Severity};

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    #[schema(example = "moderator")]
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Loggable for Role {
    fn entity_type() -> &'static str { "role" }
    fn subject_id(&self) -> String { self.name.clone() }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// Full replacement of a role's grants.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub permissions: Vec<Permission>,
}

// =============================================================================
// PERMISSION CHECK (computed)
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionCheckQuery {
    #[schema(example = "user")]
    pub resource: String,
    #[schema(example = "ban")]
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
    #[schema(example = "user:ban")]
    pub permission: String,
    /// `UNAUTHORIZED` or `INSUFFICIENT_PERMISSIONS` when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignableRolesResponse {
    pub roles: Vec<String>,
    pub default_role: String,
}
