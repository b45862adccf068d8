//! In-memory stand-ins for the remote authority and the surface
//! transport, with call recording for ordering and fetch-count assertions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use stratus_core::authority::{AssignmentMeta, RoleAuthority};
use stratus_core::error::{Result, StratusError};
use stratus_core::grant::PermissionGrant;
use stratus_core::role::RoleDefinition;

use stratus_panels::messages::EngineMessage;
use stratus_panels::panel::PanelTransport;

#[derive(Default)]
pub struct FakeAuthority {
    pub roles: Mutex<BTreeMap<String, RoleDefinition>>,
    pub group_roles: Mutex<BTreeMap<String, Vec<String>>>,
    pub user_roles: Mutex<BTreeMap<String, Vec<String>>>,
    calls: Mutex<Vec<String>>,
    fail_op: Mutex<Option<&'static str>>,
}

impl FakeAuthority {
    pub fn with_roles(names: &[&str]) -> Arc<Self> {
        let authority = Self::default();
        {
            let mut roles = authority.roles.lock().unwrap();
            for name in names {
                roles.insert(name.to_string(), RoleDefinition::new(*name));
            }
        }
        Arc::new(authority)
    }

    pub fn fail_on(&self, op: &'static str) {
        *self.fail_op.lock().unwrap() = Some(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub fn role_grants(&self, name: &str) -> Vec<PermissionGrant> {
        self.roles
            .lock()
            .unwrap()
            .get(name)
            .map(|r| r.grants().to_vec())
            .unwrap_or_default()
    }

    fn record(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.fail_op.lock().unwrap().as_deref() == Some(op) {
            return Err(StratusError::Remote(format!("{op} rejected by server")));
        }
        Ok(())
    }

    fn assignments(map: &Mutex<BTreeMap<String, Vec<String>>>, name: &str) -> BTreeMap<String, AssignmentMeta> {
        map.lock()
            .unwrap()
            .get(name)
            .into_iter()
            .flatten()
            .map(|role| (role.clone(), AssignmentMeta::default()))
            .collect()
    }
}

#[async_trait]
impl RoleAuthority for FakeAuthority {
    async fn list_all_roles(&self) -> Result<BTreeMap<String, RoleDefinition>> {
        self.record("list_all_roles")?;
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn get_role(&self, name: &str) -> Result<Option<RoleDefinition>> {
        self.record("get_role")?;
        Ok(self.roles.lock().unwrap().get(name).cloned())
    }

    async fn create_role(&self, name: &str, grants: &[PermissionGrant]) -> Result<()> {
        self.record("create_role")?;
        let role = RoleDefinition::with_grants(name, grants.to_vec())?;
        self.roles.lock().unwrap().insert(name.to_string(), role);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        self.record("delete_role")?;
        self.roles
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StratusError::NotFound(format!("role {name}")))
    }

    async fn add_permissions(&self, name: &str, grants: &[PermissionGrant]) -> Result<()> {
        self.record("add_permissions")?;
        let mut roles = self.roles.lock().unwrap();
        let role = roles
            .get_mut(name)
            .ok_or_else(|| StratusError::NotFound(format!("role {name}")))?;
        for grant in grants {
            role.insert_grant(grant.clone())?;
        }
        Ok(())
    }

    async fn remove_permissions(&self, name: &str, grants: &[PermissionGrant]) -> Result<()> {
        self.record("remove_permissions")?;
        let mut roles = self.roles.lock().unwrap();
        let role = roles
            .get_mut(name)
            .ok_or_else(|| StratusError::NotFound(format!("role {name}")))?;
        let keep: Vec<PermissionGrant> = role
            .grants()
            .iter()
            .filter(|g| !grants.contains(g))
            .cloned()
            .collect();
        *role = RoleDefinition::with_grants(name, keep)?;
        Ok(())
    }

    async fn get_group_role_assignments(
        &self,
        group: &str,
    ) -> Result<BTreeMap<String, AssignmentMeta>> {
        self.record("get_group_role_assignments")?;
        Ok(Self::assignments(&self.group_roles, group))
    }

    async fn assign_roles_to_group(&self, group: &str, roles: &[String]) -> Result<()> {
        self.record("assign_roles_to_group")?;
        self.group_roles
            .lock()
            .unwrap()
            .entry(group.to_string())
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    async fn revoke_roles_from_group(&self, group: &str, roles: &[String]) -> Result<()> {
        self.record("revoke_roles_from_group")?;
        if let Some(current) = self.group_roles.lock().unwrap().get_mut(group) {
            current.retain(|r| !roles.contains(r));
        }
        Ok(())
    }

    async fn get_user_role_assignments(
        &self,
        user: &str,
    ) -> Result<BTreeMap<String, AssignmentMeta>> {
        self.record("get_user_role_assignments")?;
        Ok(Self::assignments(&self.user_roles, user))
    }

    async fn assign_roles_to_user(&self, user: &str, roles: &[String]) -> Result<()> {
        self.record("assign_roles_to_user")?;
        self.user_roles
            .lock()
            .unwrap()
            .entry(user.to_string())
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    async fn revoke_roles_from_user(&self, user: &str, roles: &[String]) -> Result<()> {
        self.record("revoke_roles_from_user")?;
        if let Some(current) = self.user_roles.lock().unwrap().get_mut(user) {
            current.retain(|r| !roles.contains(r));
        }
        Ok(())
    }
}

/// Transport that records everything posted to one surface.
#[derive(Default)]
pub struct RecordingTransport {
    pub posted: Mutex<Vec<EngineMessage>>,
    pub reveals: Mutex<u32>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn posted(&self) -> Vec<EngineMessage> {
        self.posted.lock().unwrap().clone()
    }

    pub fn received_roles_updated(&self) -> Option<Vec<String>> {
        self.posted().into_iter().rev().find_map(|m| match m {
            EngineMessage::RolesUpdated { available_roles } => Some(available_roles),
            _ => None,
        })
    }
}

/// Newtype so the foreign `PanelTransport` trait can be implemented for a
/// shared `Arc<RecordingTransport>` without violating the orphan rule.
pub struct SharedTransport(pub Arc<RecordingTransport>);

impl PanelTransport for SharedTransport {
    fn post_message(&self, message: &EngineMessage) {
        self.0.posted.lock().unwrap().push(message.clone());
    }

    fn reveal(&self) {
        *self.0.reveals.lock().unwrap() += 1;
    }
}

pub fn read_grant(collection: &str) -> PermissionGrant {
    PermissionGrant::Data {
        collection: collection.into(),
        create: false,
        read: true,
        update: false,
        delete: false,
    }
}
