use std::sync::{Arc, Mutex, MutexGuard};

use crate::key::PanelKey;
use crate::messages::EngineMessage;
use crate::registry::ViewInstance;

/// Message channel to one UI surface.
///
/// Implementations must tolerate dead targets: posting to a surface that
/// has been torn down is a no-op, never an error. `reveal` brings the
/// surface to the foreground.
pub trait PanelTransport: Send + Sync {
    fn post_message(&self, message: &EngineMessage);
    fn reveal(&self);
}

struct PanelState {
    pending_init: Option<serde_json::Value>,
    ready: bool,
    disposed: bool,
    on_dispose: Vec<Box<dyn FnOnce() + Send>>,
}

/// A live handle bound to exactly one panel key.
///
/// The surface's own message listener attaches asynchronously, so the
/// initial payload is buffered here and transmitted only once the surface
/// signals `ready` — exactly once, and never after disposal.
pub struct PanelInstance {
    key: PanelKey,
    transport: Box<dyn PanelTransport>,
    state: Mutex<PanelState>,
}

impl PanelInstance {
    pub fn new(key: PanelKey, transport: Box<dyn PanelTransport>) -> Arc<Self> {
        Arc::new(Self {
            key,
            transport,
            state: Mutex::new(PanelState {
                pending_init: None,
                ready: false,
                disposed: false,
                on_dispose: Vec::new(),
            }),
        })
    }

    pub fn key(&self) -> &PanelKey {
        &self.key
    }

    // A poisoned lock is treated like a disposed panel: every operation
    // degrades to a no-op.
    fn state(&self) -> Option<MutexGuard<'_, PanelState>> {
        self.state.lock().ok()
    }

    /// Buffer the initial payload for delivery after the ready handshake.
    /// If the surface is already past its handshake, deliver immediately.
    pub fn queue_init(&self, payload: serde_json::Value) {
        let Some(mut state) = self.state() else { return };
        if state.disposed {
            return;
        }
        if state.ready {
            drop(state);
            self.transport
                .post_message(&EngineMessage::InitData { payload });
            return;
        }
        state.pending_init = Some(payload);
    }

    /// Handle the surface's `ready` signal: flush the pending init payload,
    /// if any. Take-once semantics make redelivery impossible.
    pub fn mark_ready(&self) {
        let pending = {
            let Some(mut state) = self.state() else { return };
            if state.disposed {
                return;
            }
            state.ready = true;
            state.pending_init.take()
        };
        if let Some(payload) = pending {
            self.transport
                .post_message(&EngineMessage::InitData { payload });
            tracing::debug!("panel {} received its init payload", self.key);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state().map(|s| s.ready).unwrap_or(false)
    }

    /// Post a message to the surface. No-op once disposed.
    pub fn post(&self, message: &EngineMessage) {
        let Some(state) = self.state() else { return };
        if state.disposed {
            return;
        }
        drop(state);
        self.transport.post_message(message);
    }

    /// Dispose the panel: drop any undelivered init payload, run disposal
    /// callbacks once, and turn every further operation into a no-op.
    pub fn dispose(&self) {
        let callbacks = {
            let Some(mut state) = self.state() else { return };
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.pending_init = None;
            std::mem::take(&mut state.on_dispose)
        };
        for callback in callbacks {
            callback();
        }
        tracing::debug!("panel {} disposed", self.key);
    }
}

impl ViewInstance for PanelInstance {
    fn reveal(&self) {
        let Some(state) = self.state() else { return };
        if state.disposed {
            return;
        }
        drop(state);
        self.transport.reveal();
    }

    fn is_disposed(&self) -> bool {
        self.state().map(|s| s.disposed).unwrap_or(true)
    }

    fn on_dispose(&self, callback: Box<dyn FnOnce() + Send>) {
        let run_now = match self.state() {
            Some(mut state) if !state.disposed => {
                state.on_dispose.push(callback);
                None
            }
            _ => Some(callback),
        };
        if let Some(callback) = run_now {
            callback();
        }
    }

    fn dispose(&self) {
        PanelInstance::dispose(self);
    }
}
