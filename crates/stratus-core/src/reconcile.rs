use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::authority::RoleAuthority;
use crate::canonical::canonical_key;
use crate::error::{Result, StratusError};
use crate::grant::PermissionGrant;
use crate::role::{is_assignable, RoleDefinition};

/// Minimal set of mutations turning an old grant set into a desired one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub to_add: Vec<PermissionGrant>,
    pub to_remove: Vec<PermissionGrant>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Result of a role save, distinguishing the mutations that change the
/// role-name list (and therefore need a broadcast) from plain grant edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The role did not exist and was created.
    Created,
    /// Existing role; `added`/`removed` grants were applied (both zero for
    /// an idempotent save).
    Updated { added: usize, removed: usize },
}

impl SaveOutcome {
    /// Whether the set of role names for the connection changed.
    pub fn changed_role_list(&self) -> bool {
        matches!(self, SaveOutcome::Created)
    }
}

/// Diff two grant sets by canonical key.
///
/// Grants present in both sets are untouched. Canonical duplicates within
/// `desired` collapse to a single entry.
pub fn diff(old: &[PermissionGrant], desired: &[PermissionGrant]) -> Result<ReconcilePlan> {
    let old_keys: HashSet<_> = old
        .iter()
        .map(canonical_key)
        .collect::<Result<_>>()?;
    let desired_keys: HashSet<_> = desired
        .iter()
        .map(canonical_key)
        .collect::<Result<_>>()?;

    let mut to_remove = Vec::new();
    for grant in old {
        if !desired_keys.contains(&canonical_key(grant)?) {
            to_remove.push(grant.clone());
        }
    }

    let mut to_add = Vec::new();
    let mut seen = HashSet::new();
    for grant in desired {
        let key = canonical_key(grant)?;
        if !old_keys.contains(&key) && seen.insert(key) {
            to_add.push(grant.clone());
        }
    }

    Ok(ReconcilePlan { to_add, to_remove })
}

/// Diff two role-name sets; used for group/user assignment reconciliation.
pub fn diff_names(current: &BTreeSet<String>, desired: &[String]) -> (Vec<String>, Vec<String>) {
    let desired_set: BTreeSet<&str> = desired.iter().map(String::as_str).collect();
    let to_add = desired_set
        .iter()
        .filter(|name| !current.contains(**name))
        .map(|name| name.to_string())
        .collect();
    let to_remove = current
        .iter()
        .filter(|name| !desired_set.contains(name.as_str()))
        .cloned()
        .collect();
    (to_add, to_remove)
}

/// Drives grant and assignment reconciliation against the remote
/// authority.
///
/// Authoritative state is always fetched fresh immediately before a diff,
/// never taken from UI state. There is no optimistic-concurrency token:
/// two concurrent editors of the same role can still race, and the fresh
/// fetch only narrows that window.
pub struct Reconciler {
    authority: Arc<dyn RoleAuthority>,
}

impl Reconciler {
    pub fn new(authority: Arc<dyn RoleAuthority>) -> Self {
        Self { authority }
    }

    /// Apply a plan to a role: removals first, then additions.
    ///
    /// Remove-before-add means the role never transiently holds a grant
    /// outside old ∪ desired, at the cost of a window where it holds fewer
    /// grants than either. An empty plan issues zero remote calls.
    pub async fn apply(&self, role: &str, plan: &ReconcilePlan) -> Result<()> {
        if plan.is_empty() {
            tracing::debug!("role '{role}' already in desired state, no calls issued");
            return Ok(());
        }

        if !plan.to_remove.is_empty() {
            if let Err(e) = self.authority.remove_permissions(role, &plan.to_remove).await {
                // Additions are never attempted after a failed removal.
                if plan.to_add.is_empty() {
                    return Err(e);
                }
                return Err(StratusError::PartialReconciliation {
                    role: role.to_string(),
                    source: Box::new(e),
                });
            }
        }

        if !plan.to_add.is_empty() {
            if let Err(e) = self.authority.add_permissions(role, &plan.to_add).await {
                if plan.to_remove.is_empty() {
                    return Err(e);
                }
                return Err(StratusError::PartialReconciliation {
                    role: role.to_string(),
                    source: Box::new(e),
                });
            }
        }

        tracing::info!(
            "role '{role}' reconciled: +{} -{}",
            plan.to_add.len(),
            plan.to_remove.len()
        );
        Ok(())
    }

    /// Reconcile a role to the desired grant set, creating it if absent.
    ///
    /// An empty `desired` on an existing role is a full revocation; any
    /// confirmation guard belongs to the caller.
    pub async fn save_role(
        &self,
        name: &str,
        desired: &[PermissionGrant],
    ) -> Result<SaveOutcome> {
        if name.trim().is_empty() {
            return Err(StratusError::Validation("role name is required".into()));
        }
        if !is_assignable(name) {
            return Err(StratusError::Validation(format!(
                "role '{name}' is built-in and cannot be edited"
            )));
        }

        match self.authority.get_role(name).await? {
            Some(current) => {
                let plan = diff(current.grants(), desired)?;
                let (added, removed) = (plan.to_add.len(), plan.to_remove.len());
                self.apply(name, &plan).await?;
                Ok(SaveOutcome::Updated { added, removed })
            }
            None => {
                let role = RoleDefinition::with_grants(name, desired.to_vec())?;
                self.authority.create_role(name, role.grants()).await?;
                tracing::info!("role '{name}' created with {} grants", role.grants().len());
                Ok(SaveOutcome::Created)
            }
        }
    }

    /// Delete a role. Built-in roles are refused before any remote call.
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(StratusError::Validation("role name is required".into()));
        }
        if !is_assignable(name) {
            return Err(StratusError::Validation(format!(
                "role '{name}' is built-in and cannot be deleted"
            )));
        }
        self.authority.delete_role(name).await?;
        tracing::info!("role '{name}' deleted");
        Ok(())
    }

    /// Reconcile the roles assigned to a group: fresh fetch, then revoke
    /// before assign, mirroring the grant discipline.
    pub async fn save_group_roles(&self, group: &str, desired: &[String]) -> Result<()> {
        if group.trim().is_empty() {
            return Err(StratusError::Validation("group name is required".into()));
        }
        self.check_assignable(desired)?;

        let current: BTreeSet<String> = self
            .authority
            .get_group_role_assignments(group)
            .await?
            .into_keys()
            .collect();
        let (to_add, to_remove) = diff_names(&current, desired);
        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        if !to_remove.is_empty() {
            self.authority.revoke_roles_from_group(group, &to_remove).await?;
        }
        if !to_add.is_empty() {
            self.authority.assign_roles_to_group(group, &to_add).await?;
        }
        tracing::info!(
            "group '{group}' roles reconciled: +{} -{}",
            to_add.len(),
            to_remove.len()
        );
        Ok(())
    }

    /// Reconcile the roles assigned to a user. Same shape as groups.
    pub async fn save_user_roles(&self, user: &str, desired: &[String]) -> Result<()> {
        if user.trim().is_empty() {
            return Err(StratusError::Validation("user name is required".into()));
        }
        self.check_assignable(desired)?;

        let current: BTreeSet<String> = self
            .authority
            .get_user_role_assignments(user)
            .await?
            .into_keys()
            .collect();
        let (to_add, to_remove) = diff_names(&current, desired);
        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        if !to_remove.is_empty() {
            self.authority.revoke_roles_from_user(user, &to_remove).await?;
        }
        if !to_add.is_empty() {
            self.authority.assign_roles_to_user(user, &to_add).await?;
        }
        tracing::info!(
            "user '{user}' roles reconciled: +{} -{}",
            to_add.len(),
            to_remove.len()
        );
        Ok(())
    }

    fn check_assignable(&self, roles: &[String]) -> Result<()> {
        for role in roles {
            if !is_assignable(role) {
                return Err(StratusError::Validation(format!(
                    "role '{role}' is built-in and cannot be assigned"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonical_key;

    fn grant(collection: &str, read: bool, create: bool) -> PermissionGrant {
        PermissionGrant::Data {
            collection: collection.into(),
            create,
            read,
            update: false,
            delete: false,
        }
    }

    #[test]
    fn full_revocation() {
        let old = vec![grant("A", true, false)];
        let plan = diff(&old, &[]).unwrap();
        assert_eq!(plan.to_remove, old);
        assert!(plan.to_add.is_empty());
    }

    #[test]
    fn pure_addition() {
        let desired = vec![grant("A", true, false), grant("B", true, false)];
        let plan = diff(&[], &desired).unwrap();
        assert_eq!(plan.to_add, desired);
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn reordered_fields_are_an_empty_diff() {
        let old: Vec<PermissionGrant> = vec![serde_json::from_str(
            r#"{"category":"data","collection":"A","read":true,"create":false}"#,
        )
        .unwrap()];
        let desired: Vec<PermissionGrant> = vec![serde_json::from_str(
            r#"{"create":false,"read":true,"collection":"A","category":"data"}"#,
        )
        .unwrap()];
        let plan = diff(&old, &desired).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn idempotence() {
        let set = vec![grant("A", true, false), grant("B", false, true)];
        let plan = diff(&set, &set).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn minimality() {
        let old = vec![grant("A", true, false), grant("B", true, false)];
        let desired = vec![grant("B", true, false), grant("C", true, false)];
        let plan = diff(&old, &desired).unwrap();

        let old_keys: Vec<_> = old.iter().map(|g| canonical_key(g).unwrap()).collect();
        let desired_keys: Vec<_> = desired.iter().map(|g| canonical_key(g).unwrap()).collect();
        for added in &plan.to_add {
            assert!(!old_keys.contains(&canonical_key(added).unwrap()));
        }
        for removed in &plan.to_remove {
            assert!(!desired_keys.contains(&canonical_key(removed).unwrap()));
        }
    }

    #[test]
    fn completeness() {
        let old = vec![grant("A", true, false), grant("B", true, true)];
        let desired = vec![grant("B", true, true), grant("C", false, true)];
        let plan = diff(&old, &desired).unwrap();

        // Apply the plan to the old set and compare canonically.
        let removed: Vec<_> = plan
            .to_remove
            .iter()
            .map(|g| canonical_key(g).unwrap())
            .collect();
        let mut result: Vec<PermissionGrant> = old
            .into_iter()
            .filter(|g| !removed.contains(&canonical_key(g).unwrap()))
            .collect();
        result.extend(plan.to_add);

        let mut result_keys: Vec<_> = result.iter().map(|g| canonical_key(g).unwrap()).collect();
        let mut desired_keys: Vec<_> =
            desired.iter().map(|g| canonical_key(g).unwrap()).collect();
        result_keys.sort();
        desired_keys.sort();
        assert_eq!(result_keys, desired_keys);
    }

    #[test]
    fn duplicate_desired_grants_collapse() {
        let desired = vec![grant("A", true, false), grant("A", true, false)];
        let plan = diff(&[], &desired).unwrap();
        assert_eq!(plan.to_add.len(), 1);
    }

    #[test]
    fn name_diff() {
        let current: BTreeSet<String> =
            ["editor".to_string(), "auditor".to_string()].into_iter().collect();
        let desired = vec!["editor".to_string(), "writer".to_string()];
        let (to_add, to_remove) = diff_names(&current, &desired);
        assert_eq!(to_add, vec!["writer"]);
        assert_eq!(to_remove, vec!["auditor"]);
    }
}
