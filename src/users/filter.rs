use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::page::Page;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Banned,
}

/// Narrowing applied to an already fetched user list.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !user.name.to_lowercase().contains(&needle) && !user.email.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(role) = self.role.as_deref().filter(|r| !r.is_empty() && *r != "all") {
            if user.role_or_default() != role {
                return false;
            }
        }

        match self.status {
            Some(UserStatus::Banned) => user.is_banned(),
            Some(UserStatus::Active) => !user.is_banned(),
            None => true,
        }
    }

    pub fn apply(&self, users: Vec<User>) -> Vec<User> {
        users.into_iter().filter(|user| self.matches(user)).collect()
    }

    pub fn paginate(&self, users: Vec<User>, page: u32, page_size: u32) -> Page<User> {
        Page::paginate(self.apply(users), page, page_size)
    }
}
