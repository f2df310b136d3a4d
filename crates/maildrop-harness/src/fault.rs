//! Storage wrappers that fail on purpose.
//!
//! Both wrappers reject an operation *before* forwarding it to the inner
//! storage, so a failed call has no side effect at all. That matches the
//! storage model the protocol is specified against: each mutation either
//! succeeds cleanly or fails with nothing changed.
//!
//! # Determinism
//!
//! [`FaultyStorage`] draws its faults from a ChaCha20 generator seeded by
//! the caller. Same seed, same operation sequence, same faults: a failing
//! chaos run reproduces exactly from its seed. For scripted scenarios
//! ("the first two attempts fail") use [`FlakyStorage`] instead.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use maildrop_core::{Storage, StorageError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Storage wrapper injecting random transient failures.
///
/// Every operation fails with probability `error_rate`, drawn from a seeded
/// RNG shared across clones (clones continue one fault sequence, they do
/// not restart it).
#[derive(Clone)]
pub struct FaultyStorage {
    inner: Arc<dyn Storage>,
    rng: Arc<Mutex<ChaCha20Rng>>,
    error_rate: f64,
}

impl FaultyStorage {
    /// Wrap `inner`, failing each operation with probability `error_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `error_rate` is outside `0.0..=1.0`. A rate of 1.0 is
    /// permitted but makes every operation fail forever.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>, seed: u64, error_rate: f64) -> Self {
        assert!((0.0..=1.0).contains(&error_rate), "error_rate must be within 0.0..=1.0");

        Self { inner, rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))), error_rate }
    }

    /// Fail `operation` according to the fault schedule.
    ///
    /// # Panics
    ///
    /// Panics if the RNG lock is poisoned. This is acceptable for test
    /// code.
    fn roll(&self, operation: &str) -> Result<(), StorageError> {
        let mut rng = self.rng.lock().expect("FaultyStorage rng lock poisoned");

        if rng.gen::<f64>() < self.error_rate {
            return Err(StorageError::Io(format!("injected {operation} fault")));
        }

        Ok(())
    }
}

impl Storage for FaultyStorage {
    fn list(&self) -> Result<Vec<Vec<u8>>, StorageError> {
        self.roll("list")?;
        self.inner.list()
    }

    fn read(&self, name: &[u8]) -> Result<Bytes, StorageError> {
        self.roll("read")?;
        self.inner.read(name)
    }

    fn write(&self, name: &[u8], data: Bytes) -> Result<(), StorageError> {
        self.roll("write")?;
        self.inner.write(name, data)
    }

    fn delete(&self, name: &[u8]) -> Result<(), StorageError> {
        self.roll("delete")?;
        self.inner.delete(name)
    }
}

/// Storage wrapper failing a fixed number of leading operations.
///
/// The first `failures` calls (across all operations, in call order) fail
/// with an injected I/O error; everything afterwards passes through. Use
/// this for scripted retry scenarios where the exact failure count matters.
#[derive(Clone)]
pub struct FlakyStorage {
    inner: Arc<dyn Storage>,
    remaining: Arc<Mutex<u64>>,
}

impl FlakyStorage {
    /// Wrap `inner`, failing the next `failures` operations.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>, failures: u64) -> Self {
        Self { inner, remaining: Arc::new(Mutex::new(failures)) }
    }

    /// Number of injected failures still pending
    ///
    /// # Panics
    ///
    /// Panics if the counter lock is poisoned. This is acceptable for test
    /// code.
    #[must_use]
    pub fn remaining_failures(&self) -> u64 {
        *self.remaining.lock().expect("FlakyStorage lock poisoned")
    }

    /// # Panics
    ///
    /// Panics if the counter lock is poisoned. This is acceptable for test
    /// code.
    fn roll(&self, operation: &str) -> Result<(), StorageError> {
        let mut remaining = self.remaining.lock().expect("FlakyStorage lock poisoned");

        if *remaining > 0 {
            *remaining -= 1;
            return Err(StorageError::Io(format!("injected {operation} fault")));
        }

        Ok(())
    }
}

impl Storage for FlakyStorage {
    fn list(&self) -> Result<Vec<Vec<u8>>, StorageError> {
        self.roll("list")?;
        self.inner.list()
    }

    fn read(&self, name: &[u8]) -> Result<Bytes, StorageError> {
        self.roll("read")?;
        self.inner.read(name)
    }

    fn write(&self, name: &[u8], data: Bytes) -> Result<(), StorageError> {
        self.roll("write")?;
        self.inner.write(name, data)
    }

    fn delete(&self, name: &[u8]) -> Result<(), StorageError> {
        self.roll("delete")?;
        self.inner.delete(name)
    }
}

#[cfg(test)]
mod tests {
    use maildrop_core::MemoryStorage;

    use super::*;

    #[test]
    fn faulty_storage_is_deterministic() {
        let run = |seed: u64| -> Vec<bool> {
            let storage =
                FaultyStorage::new(Arc::new(MemoryStorage::new()), seed, 0.5);
            (0..64).map(|_| storage.list().is_ok()).collect()
        };

        // Same seed -> same fault sequence
        assert_eq!(run(12345), run(12345));
        // Different seed -> different fault sequence
        assert_ne!(run(12345), run(54321));
    }

    #[test]
    fn faulty_failure_has_no_side_effect() {
        let inner = MemoryStorage::new();
        // Rate 1.0: every operation fails before reaching the inner store.
        let storage = FaultyStorage::new(Arc::new(inner.clone()), 0, 1.0);

        assert!(storage.write(b"name", Bytes::from_static(b"value")).is_err());
        assert!(inner.is_empty());
    }

    #[test]
    fn faulty_clones_share_fault_schedule() {
        let storage = FaultyStorage::new(Arc::new(MemoryStorage::new()), 7, 0.5);
        let alias = storage.clone();

        let direct: Vec<bool> = (0..32).map(|_| storage.list().is_ok()).collect();
        let aliased: Vec<bool> = (0..32).map(|_| alias.list().is_ok()).collect();

        // Interleaved draws from one schedule almost surely differ from a
        // restarted one.
        let restarted: Vec<bool> = {
            let fresh = FaultyStorage::new(Arc::new(MemoryStorage::new()), 7, 0.5);
            (0..32).map(|_| fresh.list().is_ok()).collect()
        };
        assert_eq!(restarted, direct);
        assert_ne!(direct, aliased);
    }

    #[test]
    fn flaky_fails_exactly_n_then_recovers() {
        let inner = MemoryStorage::new();
        let storage = FlakyStorage::new(Arc::new(inner.clone()), 2);

        assert!(storage.write(b"n", Bytes::from_static(b"v")).is_err());
        assert!(storage.write(b"n", Bytes::from_static(b"v")).is_err());
        assert!(inner.is_empty());

        storage.write(b"n", Bytes::from_static(b"v")).expect("third attempt succeeds");
        assert_eq!(inner.entry_count(), 1);
        assert_eq!(storage.remaining_failures(), 0);
    }
}
