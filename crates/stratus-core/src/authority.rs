use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::grant::PermissionGrant;
use crate::role::RoleDefinition;

/// Metadata attached to a role assignment by the remote service. Carried
/// opaquely; nothing here is interpreted locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMeta {
    #[serde(default)]
    pub granted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub granted_by: Option<String>,
}

/// The remote authorization service — the single source of truth for
/// roles, grants and assignments. This engine never implements it, only
/// consumes it; timeouts and retries belong to the implementor.
#[async_trait]
pub trait RoleAuthority: Send + Sync {
    // Roles
    async fn list_all_roles(&self) -> Result<BTreeMap<String, RoleDefinition>>;
    async fn get_role(&self, name: &str) -> Result<Option<RoleDefinition>>;
    async fn create_role(&self, name: &str, grants: &[PermissionGrant]) -> Result<()>;
    async fn delete_role(&self, name: &str) -> Result<()>;
    async fn add_permissions(&self, name: &str, grants: &[PermissionGrant]) -> Result<()>;
    async fn remove_permissions(&self, name: &str, grants: &[PermissionGrant]) -> Result<()>;

    // Group assignments
    async fn get_group_role_assignments(
        &self,
        group: &str,
    ) -> Result<BTreeMap<String, AssignmentMeta>>;
    async fn assign_roles_to_group(&self, group: &str, roles: &[String]) -> Result<()>;
    async fn revoke_roles_from_group(&self, group: &str, roles: &[String]) -> Result<()>;

    // User assignments
    async fn get_user_role_assignments(
        &self,
        user: &str,
    ) -> Result<BTreeMap<String, AssignmentMeta>>;
    async fn assign_roles_to_user(&self, user: &str, roles: &[String]) -> Result<()>;
    async fn revoke_roles_from_user(&self, user: &str, roles: &[String]) -> Result<()>;
}
