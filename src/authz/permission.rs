use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Protected object category. Unknown names survive as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resource {
    User,
    Session,
    Organization,
    Member,
    Invitation,
    Team,
    ApiKey,
    Job,
    Role,
    Custom(String),
}

impl Resource {
    pub fn as_str(&self) -> &str {
        match self {
            Resource::User => "user",
            Resource::Session => "session",
            Resource::Organization => "organization",
            Resource::Member => "member",
            Resource::Invitation => "invitation",
            Resource::Team => "team",
            Resource::ApiKey => "apiKey",
            Resource::Job => "job",
            Resource::Role => "role",
            Resource::Custom(name) => name,
        }
    }
}

impl From<&str> for Resource {
    fn from(value: &str) -> Self {
        match value {
            "user" => Resource::User,
            "session" => Resource::Session,
            "organization" => Resource::Organization,
            "member" => Resource::Member,
            "invitation" => Resource::Invitation,
            "team" => Resource::Team,
            "apiKey" => Resource::ApiKey,
            "job" => Resource::Job,
            "role" => Resource::Role,
            other => Resource::Custom(other.to_string()),
        }
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Resource::from(value.as_str())
    }
}

impl From<Resource> for String {
    fn from(value: Resource) -> Self {
        match value {
            Resource::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Create,
    Read,
    Get,
    List,
    Update,
    Delete,
    Ban,
    SetRole,
    SetPassword,
    Impersonate,
    Revoke,
    Cancel,
    Pause,
    Resume,
    Custom(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Get => "get",
            Action::List => "list",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Ban => "ban",
            Action::SetRole => "set-role",
            Action::SetPassword => "set-password",
            Action::Impersonate => "impersonate",
            Action::Revoke => "revoke",
            Action::Cancel => "cancel",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Custom(name) => name,
        }
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        match value {
            "create" => Action::Create,
            "read" => Action::Read,
            "get" => Action::Get,
            "list" => Action::List,
            "update" => Action::Update,
            "delete" => Action::Delete,
            "ban" => Action::Ban,
            "set-role" => Action::SetRole,
            "set-password" => Action::SetPassword,
            "impersonate" => Action::Impersonate,
            "revoke" => Action::Revoke,
            "cancel" => Action::Cancel,
            "pause" => Action::Pause,
            "resume" => Action::Resume,
            other => Action::Custom(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        Action::from(value.as_str())
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        match value {
            Action::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the `"resource:action"` key used for grant matching.
pub fn permission_key(resource: &Resource, action: &Action) -> String {
    format!("{}:{}", resource.as_str(), action.as_str())
}

/// A (resource, action) grant. `key` is always derived, never trusted from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "PermissionInput")]
pub struct Permission {
    #[schema(value_type = String, example = "user")]
    pub resource: Resource,
    #[schema(value_type = String, example = "ban")]
    pub action: Action,
    #[schema(example = "user:ban")]
    pub key: String,
}

impl Permission {
    pub fn new(resource: impl Into<Resource>, action: impl Into<Action>) -> Self {
        let resource = resource.into();
        let action = action.into();
        let key = permission_key(&resource, &action);
        Self {
            resource,
            action,
            key,
        }
    }

    pub fn matches(&self, resource: &Resource, action: &Action) -> bool {
        self.key == permission_key(resource, action)
    }
}

#[derive(Deserialize)]
struct PermissionInput {
    resource: Resource,
    action: Action,
}

impl From<PermissionInput> for Permission {
    fn from(input: PermissionInput) -> Self {
        Permission::new(input.resource, input.action)
    }
}

/// Grants attached to an API key instead of a role.
pub type Scopes = BTreeMap<Resource, Vec<Action>>;

pub fn scopes_allow(scopes: &Scopes, resource: &Resource, action: &Action) -> bool {
    scopes
        .get(resource)
        .map(|actions| actions.contains(action))
        .unwrap_or(false)
}
