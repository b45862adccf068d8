use std::sync::Arc;

use serde_json::json;

use stratus_core::authority::RoleAuthority;
use stratus_core::error::{Result, StratusError};
use stratus_core::reconcile::Reconciler;
use stratus_core::role::{assignable_roles, RoleDefinition};

use crate::key::{ConnectionId, PanelKey, PanelKind};
use crate::messages::{EngineMessage, GroupDraft, RoleDraft, SurfaceMessage, UserDraft};
use crate::panel::{PanelInstance, PanelTransport};
use crate::session::PanelSession;

/// User-facing command layer for one connection.
///
/// Every handler follows the same shape: validate, reconcile against
/// freshly fetched authoritative state, confirm (or report) back to the
/// panel, and broadcast when the role-name list changed. Errors from the
/// inner components propagate here and nowhere else get translated into
/// user-visible messages.
pub struct CommandContext {
    connection: ConnectionId,
    authority: Arc<dyn RoleAuthority>,
    reconciler: Reconciler,
    session: Arc<PanelSession>,
}

impl CommandContext {
    pub fn new(
        connection: ConnectionId,
        authority: Arc<dyn RoleAuthority>,
        session: Arc<PanelSession>,
    ) -> Self {
        Self {
            connection,
            reconciler: Reconciler::new(authority.clone()),
            authority,
            session,
        }
    }

    pub fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    /// Dispatch one message received from a surface. Exhaustive over the
    /// closed message union.
    pub async fn handle_surface_message(
        &self,
        panel: &Arc<PanelInstance>,
        message: SurfaceMessage,
    ) {
        match message {
            SurfaceMessage::Ready => panel.mark_ready(),
            SurfaceMessage::SaveRole { role_data } => self.save_role(panel, role_data).await,
            SurfaceMessage::SaveGroup { group_data } => self.save_group(panel, group_data).await,
            SurfaceMessage::SaveUser { user_data } => self.save_user(panel, user_data).await,
            SurfaceMessage::Cancel => panel.dispose(),
        }
    }

    /// Open (or reveal) the role editor. A role that does not exist yet
    /// opens as an empty draft; it is created on first save.
    pub async fn open_role_editor<F>(
        &self,
        name: &str,
        make_transport: F,
    ) -> Result<Arc<PanelInstance>>
    where
        F: FnOnce() -> Box<dyn PanelTransport>,
    {
        let role = self
            .authority
            .get_role(name)
            .await?
            .unwrap_or_else(|| RoleDefinition::new(name));
        let payload = serde_json::to_value(&role)?;
        let key = PanelKey::new(self.connection.clone(), PanelKind::RoleEditor, name);
        self.session.open_panel(key, payload, make_transport)
    }

    /// Open (or reveal) the role-assignment manager for a user.
    pub async fn open_user_manager<F>(
        &self,
        user: &str,
        make_transport: F,
    ) -> Result<Arc<PanelInstance>>
    where
        F: FnOnce() -> Box<dyn PanelTransport>,
    {
        let assigned: Vec<String> = self
            .authority
            .get_user_role_assignments(user)
            .await?
            .into_keys()
            .collect();
        let available = self.fetch_assignable().await?;
        let payload = json!({
            "user": user,
            "assignedRoles": assigned,
            "availableRoles": available,
        });
        let key = PanelKey::new(self.connection.clone(), PanelKind::UserManager, user);
        self.session.open_panel(key, payload, make_transport)
    }

    /// Open (or reveal) the role-assignment manager for a group.
    pub async fn open_group_manager<F>(
        &self,
        group: &str,
        make_transport: F,
    ) -> Result<Arc<PanelInstance>>
    where
        F: FnOnce() -> Box<dyn PanelTransport>,
    {
        let assigned: Vec<String> = self
            .authority
            .get_group_role_assignments(group)
            .await?
            .into_keys()
            .collect();
        let available = self.fetch_assignable().await?;
        let payload = json!({
            "group": group,
            "assignedRoles": assigned,
            "availableRoles": available,
        });
        let key = PanelKey::new(self.connection.clone(), PanelKind::GroupManager, group);
        self.session.open_panel(key, payload, make_transport)
    }

    /// Delete a role, close its editor panel if one is open, and broadcast
    /// the shrunken role list. Initiated from outside any panel, so errors
    /// return to the caller instead of being posted.
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        self.reconciler.delete_role(name).await?;
        let key = PanelKey::new(self.connection.clone(), PanelKind::RoleEditor, name);
        self.session.close_panel(&key);
        self.session
            .broadcaster()
            .notify_role_list_changed(&self.connection, self.authority.as_ref())
            .await
    }

    async fn save_role(&self, panel: &Arc<PanelInstance>, draft: RoleDraft) {
        match self.reconciler.save_role(&draft.name, &draft.grants).await {
            Ok(outcome) => {
                panel.post(&EngineMessage::RoleSaved);
                if outcome.changed_role_list() {
                    // The save already succeeded; a failed broadcast fetch
                    // must not turn the confirmation into an error.
                    if let Err(e) = self
                        .session
                        .broadcaster()
                        .notify_role_list_changed(&self.connection, self.authority.as_ref())
                        .await
                    {
                        tracing::warn!(
                            "role-list broadcast on '{}' failed: {e}",
                            self.connection
                        );
                    }
                }
            }
            Err(e) => self.report(panel, e),
        }
    }

    async fn save_group(&self, panel: &Arc<PanelInstance>, draft: GroupDraft) {
        match self
            .reconciler
            .save_group_roles(&draft.group, &draft.roles)
            .await
        {
            // Assignment edits never change the role-name list, so no
            // broadcast here.
            Ok(()) => panel.post(&EngineMessage::GroupSaved),
            Err(e) => self.report(panel, e),
        }
    }

    async fn save_user(&self, panel: &Arc<PanelInstance>, draft: UserDraft) {
        match self
            .reconciler
            .save_user_roles(&draft.user, &draft.roles)
            .await
        {
            Ok(()) => panel.post(&EngineMessage::UserSaved),
            Err(e) => self.report(panel, e),
        }
    }

    async fn fetch_assignable(&self) -> Result<Vec<String>> {
        let roles = self.authority.list_all_roles().await?;
        Ok(assignable_roles(roles.into_keys()))
    }

    fn report(&self, panel: &Arc<PanelInstance>, error: StratusError) {
        tracing::warn!("command on panel {} failed: {error}", panel.key());
        panel.post(&EngineMessage::Error {
            message: error.to_string(),
        });
    }
}
