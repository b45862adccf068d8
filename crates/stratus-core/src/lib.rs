pub mod authority;
pub mod canonical;
pub mod config;
pub mod error;
pub mod grant;
pub mod reconcile;
pub mod role;

pub use authority::{AssignmentMeta, RoleAuthority};
pub use canonical::{canonical_key, CanonicalKey};
pub use error::{Result, StratusError};
pub use grant::{PermissionGrant, RoleScope, Verbosity, WILDCARD};
pub use reconcile::{diff, diff_names, ReconcilePlan, Reconciler, SaveOutcome};
pub use role::{assignable_roles, is_assignable, RoleDefinition, BUILT_IN_ROLES};
