use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stratus_core::authority::RoleAuthority;
use stratus_core::error::{Result, StratusError};
use stratus_core::role::assignable_roles;

use crate::key::ConnectionId;
use crate::messages::EngineMessage;
use crate::panel::PanelInstance;
use crate::registry::ViewInstance;

/// Fans authoritative role-list changes out to every open surface that
/// cares about a connection.
///
/// Subscriptions are never explicitly removed: a disposed panel's message
/// channel is a defined no-op, so dead subscribers are harmless (they are
/// dropped lazily while snapshotting). Fires only on mutations that change
/// the role-name list, never on grant edits within an existing role.
pub struct RoleListBroadcaster {
    subscribers: Mutex<HashMap<ConnectionId, Vec<Arc<PanelInstance>>>>,
}

impl RoleListBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a panel for role-list pushes on a connection. Panels of
    /// different kinds share one subscriber list per connection.
    pub fn subscribe(&self, connection: &ConnectionId, panel: Arc<PanelInstance>) -> Result<()> {
        let mut subscribers = self.lock()?;
        subscribers
            .entry(connection.clone())
            .or_default()
            .push(panel);
        Ok(())
    }

    pub fn subscriber_count(&self, connection: &ConnectionId) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.get(connection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Push the fresh, assignable-filtered role-name list to every
    /// subscriber of `connection`.
    ///
    /// Exactly one authoritative fetch per notification, regardless of the
    /// number of subscribers. Skipped entirely when nobody listens.
    pub async fn notify_role_list_changed(
        &self,
        connection: &ConnectionId,
        authority: &dyn RoleAuthority,
    ) -> Result<()> {
        let targets: Vec<Arc<PanelInstance>> = {
            let mut subscribers = self.lock()?;
            match subscribers.get_mut(connection) {
                Some(list) => {
                    list.retain(|panel| !panel.is_disposed());
                    list.clone()
                }
                None => Vec::new(),
            }
        };
        if targets.is_empty() {
            return Ok(());
        }

        let roles = authority.list_all_roles().await?;
        let available = assignable_roles(roles.into_keys());
        tracing::info!(
            "broadcasting {} assignable roles on '{connection}' to {} panels",
            available.len(),
            targets.len()
        );

        let message = EngineMessage::RolesUpdated {
            available_roles: available,
        };
        for panel in &targets {
            panel.post(&message);
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ConnectionId, Vec<Arc<PanelInstance>>>>> {
        self.subscribers
            .lock()
            .map_err(|_| StratusError::Internal("broadcaster lock poisoned".into()))
    }
}

impl Default for RoleListBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
