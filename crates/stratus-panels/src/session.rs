use std::sync::Arc;

use stratus_core::error::Result;

use crate::broadcast::RoleListBroadcaster;
use crate::key::PanelKey;
use crate::messages::EngineMessage;
use crate::panel::{PanelInstance, PanelTransport};
use crate::registry::ViewRegistry;

/// Panel state owned by one running session: the view registry and the
/// role-list broadcaster. Passed by reference into command handlers
/// instead of living in process-wide statics.
pub struct PanelSession {
    registry: ViewRegistry<PanelKey, PanelInstance>,
    broadcaster: Arc<RoleListBroadcaster>,
}

impl PanelSession {
    pub fn new() -> Self {
        Self {
            registry: ViewRegistry::new(),
            broadcaster: Arc::new(RoleListBroadcaster::new()),
        }
    }

    pub fn registry(&self) -> &ViewRegistry<PanelKey, PanelInstance> {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<RoleListBroadcaster> {
        &self.broadcaster
    }

    /// Open the panel for `key`, or reveal the live one.
    ///
    /// A fresh panel buffers `init` behind the ready handshake and is
    /// subscribed to role-list broadcasts for its connection. A revealed
    /// panel instead receives `init` as an update message — its surface is
    /// already listening, so the ready gate does not apply, and it keeps
    /// its existing subscription.
    pub fn open_panel<F>(
        &self,
        key: PanelKey,
        init: serde_json::Value,
        make_transport: F,
    ) -> Result<Arc<PanelInstance>>
    where
        F: FnOnce() -> Box<dyn PanelTransport>,
    {
        let connection = key.connection.clone();
        let factory_key = key.clone();
        let (panel, created) = self
            .registry
            .create_or_show(key, move || Ok(PanelInstance::new(factory_key, make_transport())))?;

        if created {
            panel.queue_init(init);
            self.broadcaster.subscribe(&connection, panel.clone())?;
        } else {
            panel.post(&EngineMessage::UpdateData { payload: init });
        }
        Ok(panel)
    }

    /// Close the panel under `key`, if any (programmatic close, e.g. after
    /// deleting the resource it displays).
    pub fn close_panel(&self, key: &PanelKey) -> bool {
        self.registry.close(key)
    }
}

impl Default for PanelSession {
    fn default() -> Self {
        Self::new()
    }
}
