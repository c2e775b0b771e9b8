use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::permission::{Action, Permission, Resource};
use super::roles;
use crate::errors::AppResult;
use crate::models::rbac::Role;

/// Storage for role -> permission grants.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles with expanded permission lists, in table order.
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Permissions of one role. Unknown roles have none.
    async fn get(&self, role: &str) -> AppResult<Vec<Permission>>;

    /// Discard the role's grants and rebuild them from `permissions`.
    async fn replace(&self, role: &str, permissions: Vec<Permission>) -> AppResult<Role>;
}

pub type Grants = Vec<(Resource, Vec<Action>)>;

#[derive(Debug, Clone)]
struct RoleEntry {
    name: String,
    grants: Grants,
}

impl RoleEntry {
    fn expand(&self) -> Vec<Permission> {
        self.grants
            .iter()
            .flat_map(|(resource, actions)| {
                actions
                    .iter()
                    .map(move |action| Permission::new(resource.clone(), action.clone()))
            })
            .collect()
    }

    fn to_role(&self) -> Role {
        Role {
            name: self.name.clone(),
            permissions: self.expand(),
        }
    }
}

/// Groups actions by resource, resources in order of first appearance.
fn group_by_resource(permissions: Vec<Permission>) -> Grants {
    let mut grants: Grants = Vec::new();
    for perm in permissions {
        match grants.iter_mut().find(|(resource, _)| *resource == perm.resource) {
            Some((_, actions)) => actions.push(perm.action),
            None => grants.push((perm.resource, vec![perm.action])),
        }
    }
    grants
}

/// Process-local role table. Each instance is independent, so tests can build their own.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    table: RwLock<Vec<RoleEntry>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with [`default_table`].
    pub fn with_defaults() -> Self {
        Self::from_table(default_table())
    }

    pub fn from_table<N, I>(table: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Grants)>,
    {
        let entries = table
            .into_iter()
            .map(|(name, grants)| RoleEntry {
                name: name.into(),
                grants,
            })
            .collect();
        Self {
            table: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list(&self) -> AppResult<Vec<Role>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.iter().map(RoleEntry::to_role).collect())
    }

    async fn get(&self, role: &str) -> AppResult<Vec<Permission>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .iter()
            .find(|entry| entry.name == role)
            .map(RoleEntry::expand)
            .unwrap_or_default())
    }

    async fn replace(&self, role: &str, permissions: Vec<Permission>) -> AppResult<Role> {
        let grants = group_by_resource(permissions);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        let entry = match table.iter().position(|entry| entry.name == role) {
            Some(index) => {
                table[index].grants = grants;
                &table[index]
            }
            None => {
                table.push(RoleEntry {
                    name: role.to_string(),
                    grants,
                });
                &table[table.len() - 1]
            }
        };

        tracing::debug!(role = %entry.name, resources = entry.grants.len(), "role grants replaced");
        Ok(entry.to_role())
    }
}

/// Grants every process starts with.
pub fn default_table() -> Vec<(&'static str, Grants)> {
    use Action::*;

    vec![
        (
            roles::ADMIN,
            vec![
                (
                    Resource::User,
                    vec![Create, List, Get, Update, Delete, Ban, SetRole, SetPassword, Impersonate],
                ),
                (Resource::Session, vec![List, Revoke, Delete]),
                (Resource::Organization, vec![Create, Read, Update, Delete]),
                (Resource::Member, vec![Create, Update, Delete]),
                (Resource::Invitation, vec![Create, Cancel]),
                (Resource::Team, vec![Create, Update, Delete]),
                (Resource::ApiKey, vec![Create, List, Update, Delete]),
                (Resource::Job, vec![Create, List, Read, Delete, Pause, Resume]),
                (Resource::Role, vec![List, Read, Update]),
            ],
        ),
        (
            roles::MODERATOR,
            vec![
                (Resource::User, vec![List, Get, Ban]),
                (Resource::Session, vec![List, Revoke]),
                (Resource::Job, vec![List, Read]),
                (Resource::Role, vec![List, Read]),
            ],
        ),
        (
            roles::USER,
            vec![
                (Resource::ApiKey, vec![Create, List, Update, Delete]),
                (Resource::Organization, vec![Read]),
            ],
        ),
    ]
}
