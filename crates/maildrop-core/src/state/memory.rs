use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use super::{ConnectionId, ConnectionState, StateStore};
use crate::storage::Result;

/// In-memory state store for testing and simulation
///
/// Counter pairs live in a HashMap behind a reader-writer lock, wrapped in
/// `Arc<RwLock<>>` to allow Clone. Unlike [`crate::MemoryStorage`], an
/// instance of this store belongs to a *single* endpoint: the state backend
/// is local by design, never shared between peers.
///
/// # Thread Safety
///
/// Thread-safe through RwLock; `lock().expect()` panics on poisoning, which
/// is acceptable for test code.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    states: Arc<RwLock<HashMap<ConnectionId, ConnectionState>>>,
}

impl MemoryStateStore {
    /// Create a new empty MemoryStateStore
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of connections with persisted state
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.states.read().expect("MemoryStateStore lock poisoned").len()
    }
}

impl StateStore for MemoryStateStore {
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn list(&self) -> Result<Vec<ConnectionId>> {
        let states = self.states.read().expect("MemoryStateStore lock poisoned");

        Ok(states.keys().cloned().collect())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn load(&self, id: &ConnectionId) -> Result<ConnectionState> {
        let states = self.states.read().expect("MemoryStateStore lock poisoned");

        Ok(states.get(id).copied().unwrap_or_default())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn store(&self, id: &ConnectionId, state: ConnectionState) -> Result<()> {
        let mut states = self.states.write().expect("MemoryStateStore lock poisoned");

        states.insert(id.clone(), state);

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn remove(&self, id: &ConnectionId) -> Result<()> {
        let mut states = self.states.write().expect("MemoryStateStore lock poisoned");

        states.remove(id);

        Ok(())
    }
}
