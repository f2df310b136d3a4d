//! Outbound half of a connection.
//!
//! [`Sender`] writes each outgoing message under its deterministic name
//! `(local, remote, tx)` and advances `tx` only after the write succeeded.
//!
//! # Ordering: load, decide, write, commit
//!
//! 1. Load the connection state.
//! 2. Derive the entry name from the current `tx`.
//! 3. Write the message blob (single atomic replace).
//! 4. Persist `tx + 1`.
//!
//! A failure at any step leaves both the storage and the counter untouched,
//! so retrying the call is safe: the deterministic name makes the retry
//! overwrite its own earlier attempt with identical bytes. If a caller
//! retries with a *different* message at the same `tx`, last-writer-wins
//! applies.
//!
//! The sender never deletes anything. Reclaiming delivered messages is the
//! receiver's job (see [`crate::receiver`]), which is what keeps the two
//! endpoints from ever contending on a storage key.

use std::sync::Arc;

use bytes::Bytes;
use maildrop_proto::MessageHeader;

use crate::{
    state::{ConnectionId, ConnectionState, StateStore},
    storage::{Result, Storage, StorageError},
};

/// Outbound message writer for one connection.
///
/// Concurrent `send` calls on the same connection must be externally
/// serialized (they contend on `tx`); sends on different connections, and
/// a concurrent receive on this one, need no coordination.
pub struct Sender {
    conn: ConnectionId,
    storage: Arc<dyn Storage>,
    state: Arc<dyn StateStore>,
}

impl Sender {
    /// Create a sender for `conn` over the given adapters.
    #[must_use]
    pub fn new(conn: ConnectionId, storage: Arc<dyn Storage>, state: Arc<dyn StateStore>) -> Self {
        Self { conn, storage, state }
    }

    /// The connection this sender writes to
    #[must_use]
    pub fn connection(&self) -> &ConnectionId {
        &self.conn
    }

    /// Send `message` to the peer, returning the counter it was written
    /// under.
    ///
    /// # Errors
    ///
    /// Returns the storage error verbatim if any step fails. On error
    /// neither the storage nor `tx` has advanced; the call may simply be
    /// repeated.
    pub fn send(&self, message: Bytes) -> Result<u64> {
        let s = self.state.load(&self.conn)?;

        // Decide before mutating: a tx overflow must not leave an orphan blob.
        let next_tx = s.tx.checked_add(1).ok_or_else(|| {
            StorageError::Io(format!("tx counter overflow on {:?}", self.conn))
        })?;

        let header =
            MessageHeader::new(self.conn.local.clone(), self.conn.remote.clone(), s.tx);
        let name = header.encode();

        self.storage.write(&name, message)?;

        self.state.store(&self.conn, ConnectionState { rx: s.rx, tx: next_tx })?;

        tracing::debug!(conn = ?self.conn, counter = s.tx, "outbound message written");

        Ok(s.tx)
    }
}

#[cfg(test)]
mod tests {
    use maildrop_proto::Address;

    use super::*;
    use crate::{state::MemoryStateStore, storage::MemoryStorage};

    fn setup() -> (Sender, MemoryStorage, MemoryStateStore, ConnectionId) {
        let storage = MemoryStorage::new();
        let state = MemoryStateStore::new();
        let conn = ConnectionId::new(
            Address::predefined(vec![0x01; 24]).unwrap(),
            Address::predefined(vec![0x02; 24]).unwrap(),
        );
        let sender =
            Sender::new(conn.clone(), Arc::new(storage.clone()), Arc::new(state.clone()));

        (sender, storage, state, conn)
    }

    #[test]
    fn send_writes_under_deterministic_name() {
        let (sender, storage, state, conn) = setup();

        let counter = sender.send(Bytes::from_static(b"hello")).expect("send failed");
        assert_eq!(counter, 0);

        let name =
            MessageHeader::new(conn.local.clone(), conn.remote.clone(), 0).encode();
        assert_eq!(storage.read(&name).expect("read failed"), Bytes::from_static(b"hello"));

        assert_eq!(state.load(&conn).unwrap(), ConnectionState { rx: 0, tx: 1 });
    }

    #[test]
    fn counters_are_assigned_sequentially() {
        let (sender, storage, state, conn) = setup();

        for expected in 0..5 {
            let counter = sender.send(Bytes::from_static(b"m")).expect("send failed");
            assert_eq!(counter, expected);
        }

        assert_eq!(storage.entry_count(), 5);
        assert_eq!(state.load(&conn).unwrap().tx, 5);
    }

    #[test]
    fn send_does_not_touch_rx() {
        let (sender, _storage, state, conn) = setup();

        state.store(&conn, ConnectionState { rx: 42, tx: 0 }).expect("store failed");
        sender.send(Bytes::from_static(b"m")).expect("send failed");

        assert_eq!(state.load(&conn).unwrap(), ConnectionState { rx: 42, tx: 1 });
    }

    #[test]
    fn tx_overflow_is_an_error_before_any_write() {
        let (sender, storage, state, conn) = setup();

        state.store(&conn, ConnectionState { rx: 0, tx: u64::MAX }).expect("store failed");

        let result = sender.send(Bytes::from_static(b"m"));
        assert!(matches!(result, Err(StorageError::Io(_))));

        // Nothing advanced, nothing written.
        assert!(storage.is_empty());
        assert_eq!(state.load(&conn).unwrap().tx, u64::MAX);
    }
}
