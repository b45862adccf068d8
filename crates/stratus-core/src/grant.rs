use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope value matching every resource of a category.
///
/// Treated as an ordinary literal everywhere: a wildcard grant and a
/// narrower grant are distinct permissions for diffing purposes.
pub const WILDCARD: &str = "*";

/// One unit of access against the remote service: a category, a target
/// scope, and the action flags that category supports.
///
/// The `category` tag is part of the serialized form, so two grants from
/// different categories can never collide on a canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum PermissionGrant {
    CollectionConfig {
        collection: String,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
    },
    Data {
        collection: String,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
    },
    Backup {
        collection: String,
        #[serde(default)]
        manage: bool,
    },
    Tenant {
        collection: String,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
    },
    Role {
        role: String,
        #[serde(default)]
        scope: RoleScope,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
    },
    User {
        user: String,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
        #[serde(default)]
        assign_and_revoke: bool,
    },
    Group {
        group: String,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        assign_and_revoke: bool,
    },
    Cluster {
        #[serde(default)]
        read: bool,
    },
    Node {
        collection: String,
        #[serde(default)]
        verbosity: Verbosity,
        #[serde(default)]
        read: bool,
    },
    Replication {
        collection: String,
        shard: String,
        #[serde(default)]
        create: bool,
        #[serde(default)]
        read: bool,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        delete: bool,
    },
}

impl PermissionGrant {
    /// Category tag of this grant. Exhaustive: adding a variant without
    /// wiring it through here is a compile error.
    pub fn category(&self) -> &'static str {
        match self {
            PermissionGrant::CollectionConfig { .. } => "collection_config",
            PermissionGrant::Data { .. } => "data",
            PermissionGrant::Backup { .. } => "backup",
            PermissionGrant::Tenant { .. } => "tenant",
            PermissionGrant::Role { .. } => "role",
            PermissionGrant::User { .. } => "user",
            PermissionGrant::Group { .. } => "group",
            PermissionGrant::Cluster { .. } => "cluster",
            PermissionGrant::Node { .. } => "node",
            PermissionGrant::Replication { .. } => "replication",
        }
    }

    /// Target scope string, if the category has one. Cluster-wide grants
    /// return `None`.
    pub fn scope(&self) -> Option<&str> {
        match self {
            PermissionGrant::CollectionConfig { collection, .. }
            | PermissionGrant::Data { collection, .. }
            | PermissionGrant::Backup { collection, .. }
            | PermissionGrant::Tenant { collection, .. }
            | PermissionGrant::Node { collection, .. }
            | PermissionGrant::Replication { collection, .. } => Some(collection),
            PermissionGrant::Role { role, .. } => Some(role),
            PermissionGrant::User { user, .. } => Some(user),
            PermissionGrant::Group { group, .. } => Some(group),
            PermissionGrant::Cluster { .. } => None,
        }
    }
}

impl fmt::Display for PermissionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope() {
            Some(scope) => write!(f, "{}:{scope}", self.category()),
            None => write!(f, "{}", self.category()),
        }
    }
}

/// Match scope for role-category grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    #[default]
    All,
    Match,
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleScope::All => write!(f, "all"),
            RoleScope::Match => write!(f, "match"),
        }
    }
}

impl std::str::FromStr for RoleScope {
    type Err = crate::error::StratusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(RoleScope::All),
            "match" => Ok(RoleScope::Match),
            other => Err(crate::error::StratusError::Validation(format!(
                "unknown role scope: {other}"
            ))),
        }
    }
}

/// Detail level for node-category grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Minimal,
    Verbose,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Minimal => write!(f, "minimal"),
            Verbosity::Verbose => write!(f, "verbose"),
        }
    }
}
