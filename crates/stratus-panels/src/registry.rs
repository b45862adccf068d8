use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use stratus_core::error::{Result, StratusError};

/// Minimal surface the registry needs from a live view instance.
pub trait ViewInstance {
    fn reveal(&self);
    fn is_disposed(&self) -> bool;
    /// Register a disposal callback. Runs immediately if the instance is
    /// already disposed.
    fn on_dispose(&self, callback: Box<dyn FnOnce() + Send>);
    fn dispose(&self);
}

/// Keyed store of at-most-one live view instance per logical key.
///
/// Owned by the session context and passed by reference; there is no
/// process-wide registry. Disposal of an instance prunes its entry, so a
/// key becomes reusable the moment its panel closes.
pub struct ViewRegistry<K, V> {
    entries: Arc<Mutex<HashMap<K, Arc<V>>>>,
}

impl<K, V> ViewRegistry<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: ViewInstance + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the live instance for `key`, revealing it, or build one via
    /// `factory`. The boolean reports whether the factory ran.
    ///
    /// A revealed instance is returned unchanged: no second instance, no
    /// duplicate subscriptions or listeners.
    pub fn create_or_show<F>(&self, key: K, factory: F) -> Result<(Arc<V>, bool)>
    where
        F: FnOnce() -> Result<Arc<V>>,
    {
        let mut entries = self.lock()?;
        if let Some(existing) = entries.get(&key) {
            let existing = existing.clone();
            drop(entries);
            existing.reveal();
            return Ok((existing, false));
        }

        let instance = factory()?;
        entries.insert(key.clone(), instance.clone());
        drop(entries);

        // Prune the entry the moment the instance disposes. Weak, so a
        // dropped registry doesn't keep the map alive through callbacks.
        let entries_ref = Arc::downgrade(&self.entries);
        instance.on_dispose(Box::new(move || {
            if let Some(entries) = entries_ref.upgrade() {
                if let Ok(mut entries) = entries.lock() {
                    entries.remove(&key);
                }
            }
        }));

        Ok((instance, true))
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Programmatic close: remove the entry, then dispose the instance.
    /// Returns whether a live instance was found under the key.
    pub fn close(&self, key: &K) -> bool {
        let removed = match self.lock() {
            Ok(mut entries) => entries.remove(key),
            Err(_) => None,
        };
        match removed {
            Some(instance) => {
                instance.dispose();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<K, Arc<V>>>> {
        self.entries
            .lock()
            .map_err(|_| StratusError::Internal("view registry lock poisoned".into()))
    }
}

impl<K, V> Default for ViewRegistry<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: ViewInstance + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
