//! Role names and the whitelist of roles the console may assign.

use crate::errors::{AppError, AppResult};

pub const ADMIN: &str = "admin";
pub const MODERATOR: &str = "moderator";
pub const USER: &str = "user";

/// Role given to accounts that carry none.
pub const DEFAULT_ROLE: &str = USER;

pub const ASSIGNABLE_ROLES: &[&str] = &[USER, MODERATOR, ADMIN];

pub fn validate_assignable(role: &str) -> AppResult<&'static str> {
    ASSIGNABLE_ROLES
        .iter()
        .copied()
        .find(|candidate| *candidate == role.trim())
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "role '{role}' cannot be assigned; expected one of {}",
                ASSIGNABLE_ROLES.join(", ")
            ))
        })
}

/// Falls back to [`DEFAULT_ROLE`] for missing or blank roles.
pub fn role_or_default(role: Option<&str>) -> &str {
    match role.map(str::trim) {
        Some(role) if !role.is_empty() => role,
        _ => DEFAULT_ROLE,
    }
}

pub fn is_admin_role(role: Option<&str>) -> bool {
    role.map(str::trim) == Some(ADMIN)
}
