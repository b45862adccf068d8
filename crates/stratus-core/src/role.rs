use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::canonical::canonical_key;
use crate::error::Result;
use crate::grant::PermissionGrant;

/// Superuser role managed by the remote service itself.
pub const SUPERUSER_ROLE: &str = "root";

/// Built-in read-only role.
pub const READ_ONLY_ROLE: &str = "viewer";

/// Role names that are never editable or assignable through this engine.
pub const BUILT_IN_ROLES: &[&str] = &[SUPERUSER_ROLE, READ_ONLY_ROLE];

/// Policy predicate for role assignment, applied once at the
/// reconciler/broadcaster boundary rather than at every call site.
pub fn is_assignable(name: &str) -> bool {
    !BUILT_IN_ROLES.contains(&name)
}

/// Filter a role-name list down to the assignable ones, sorted.
pub fn assignable_roles<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let filtered: BTreeSet<String> = names.into_iter().filter(|n| is_assignable(n)).collect();
    filtered.into_iter().collect()
}

/// A role name plus the union of its grants across all categories.
///
/// The grant collection never holds two entries with equal canonical keys;
/// insertion enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    grants: Vec<PermissionGrant>,
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grants: Vec::new(),
        }
    }

    /// Build a role from a grant list, dropping canonical duplicates.
    pub fn with_grants(name: impl Into<String>, grants: Vec<PermissionGrant>) -> Result<Self> {
        let mut role = Self::new(name);
        for grant in grants {
            role.insert_grant(grant)?;
        }
        Ok(role)
    }

    pub fn grants(&self) -> &[PermissionGrant] {
        &self.grants
    }

    pub fn into_grants(self) -> Vec<PermissionGrant> {
        self.grants
    }

    /// Insert a grant unless one with the same canonical key is already
    /// present. Returns whether the grant was added.
    pub fn insert_grant(&mut self, grant: PermissionGrant) -> Result<bool> {
        let key = canonical_key(&grant)?;
        for existing in &self.grants {
            if canonical_key(existing)? == key {
                return Ok(false);
            }
        }
        self.grants.push(grant);
        Ok(true)
    }

    pub fn is_built_in(&self) -> bool {
        !is_assignable(&self.name)
    }
}
