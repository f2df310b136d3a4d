use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use bytes::Bytes;

use super::{Result, Storage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// Entries live in a HashMap behind a reader-writer lock. The whole map is
/// wrapped in `Arc<RwLock<>>` to allow Clone and concurrent access: the
/// multi-threaded harness shares a single `MemoryStorage` between every
/// endpoint, exactly as real endpoints share one cloud folder.
///
/// # Thread Safety
///
/// This implementation is thread-safe through RwLock. It uses
/// `lock().expect()` which will panic if the lock is poisoned (a thread
/// panicked while holding it). This is acceptable for test code.
///
/// # Semantics
///
/// - `write` replaces the value under the lock, which makes it atomic from
///   the point of view of every other thread.
/// - `list` clones the key set under the read lock: a consistent snapshot.
/// - `delete` of an absent entry succeeds, matching the storage contract.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<Vec<u8>, Bytes>>>,
}

impl MemoryStorage {
    /// Create a new empty MemoryStorage
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Get the number of stored entries
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (a thread panicked while
    /// holding it). This is acceptable for test/simulation code.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.read().expect("MemoryStorage lock poisoned").len()
    }

    /// Check whether the store holds no entries at all
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("MemoryStorage lock poisoned").is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn list(&self) -> Result<Vec<Vec<u8>>> {
        let entries = self.entries.read().expect("MemoryStorage lock poisoned");

        Ok(entries.keys().cloned().collect())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn read(&self, name: &[u8]) -> Result<Bytes> {
        let entries = self.entries.read().expect("MemoryStorage lock poisoned");

        entries.get(name).cloned().ok_or(StorageError::NoSuchEntry)
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn write(&self, name: &[u8], data: Bytes) -> Result<()> {
        let mut entries = self.entries.write().expect("MemoryStorage lock poisoned");

        // Bytes clones are cheap (Arc increment), so replace unconditionally.
        entries.insert(name.to_vec(), data);

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. This is acceptable for test
    /// code.
    fn delete(&self, name: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().expect("MemoryStorage lock poisoned");

        entries.remove(name);

        Ok(())
    }
}
