use super::permission::Scopes;

/// The caller as seen by the evaluator: a user identity, API-key scopes, or both.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub api_key_scopes: Option<Scopes>,
}

impl Subject {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Some(role.into()),
            api_key_scopes: None,
        }
    }

    pub fn api_key(scopes: Scopes) -> Self {
        Self {
            api_key_scopes: Some(scopes),
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_api_key_scopes(mut self, scopes: Scopes) -> Self {
        self.api_key_scopes = Some(scopes);
        self
    }

    /// Identity is usable only when both id and role are non-empty.
    pub fn identity(&self) -> Option<(&str, &str)> {
        let id = self.user_id.as_deref().filter(|id| !id.is_empty())?;
        let role = self.role.as_deref().filter(|role| !role.is_empty())?;
        Some((id, role))
    }

    pub fn is_admin(&self) -> bool {
        self.identity()
            .map(|(_, role)| role == super::roles::ADMIN)
            .unwrap_or(false)
    }
}
