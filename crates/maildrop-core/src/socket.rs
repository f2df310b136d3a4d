//! Per-endpoint facade over the protocol components.
//!
//! A [`Socket`] bundles the two adapters (shared storage, local state
//! store) and exposes every operation keyed by [`ConnectionId`], so
//! application code holds one object per endpoint instead of wiring
//! senders and receivers by hand. It adds the two operations that span
//! components: [`Socket::discover`] and [`Socket::destroy`].

use std::{collections::BTreeSet, sync::Arc};

use bytes::Bytes;
use maildrop_proto::{Address, MessageHeader};

use crate::{
    discovery::Discovery,
    receiver::{DeliveryError, Receiver, View},
    sender::Sender,
    state::{ConnectionId, StateStore},
    storage::{Result, Storage},
};

/// Per-endpoint protocol facade.
///
/// The socket itself is stateless: all durable state lives in the adapters,
/// so sockets are cheap to construct and an endpoint may hold several over
/// the same pair of adapters. The serialization rules of [`Sender`] and
/// [`Receiver`] apply unchanged: per connection, at most one thread in
/// `send` and one thread in a consuming call at a time.
pub struct Socket {
    storage: Arc<dyn Storage>,
    state: Arc<dyn StateStore>,
}

impl Socket {
    /// Create a socket over the given adapters.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, state: Arc<dyn StateStore>) -> Self {
        Self { storage, state }
    }

    /// Send `message` on `conn`, returning the counter it was written
    /// under.
    ///
    /// # Errors
    ///
    /// See [`Sender::send`].
    pub fn send(&self, conn: &ConnectionId, message: Bytes) -> Result<u64> {
        self.sender(conn).send(message)
    }

    /// Fetch and consume the next inbound message on `conn`.
    ///
    /// # Errors
    ///
    /// See [`Receiver::receive`].
    pub fn receive(&self, conn: &ConnectionId) -> Result<Option<Bytes>> {
        self.receiver(conn).receive()
    }

    /// Consume the next inbound message on `conn` through a handler that
    /// runs before the counter advances.
    ///
    /// # Errors
    ///
    /// See [`Receiver::receive_with`].
    pub fn receive_with<T, E, F>(
        &self,
        conn: &ConnectionId,
        f: F,
    ) -> std::result::Result<Option<T>, DeliveryError<E>>
    where
        F: FnOnce(&Bytes) -> std::result::Result<T, E>,
    {
        self.receiver(conn).receive_with(f)
    }

    /// Return the message at logical offset `rx + nth` on `conn` without
    /// consuming it.
    ///
    /// # Errors
    ///
    /// See [`View::peek`].
    pub fn peek(&self, conn: &ConnectionId, nth: u64) -> Result<Option<Bytes>> {
        self.receiver(conn).peek(nth)
    }

    /// True if the next inbound message on `conn` is available.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    pub fn can_receive(&self, conn: &ConnectionId) -> Result<bool> {
        Ok(self.peek(conn, 0)?.is_some())
    }

    /// Count gap-free available inbound messages on `conn`.
    ///
    /// # Errors
    ///
    /// See [`View::pending`].
    pub fn pending(&self, conn: &ConnectionId) -> Result<u64> {
        self.receiver(conn).pending()
    }

    /// Delete consumed inbound entries of `conn`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// See [`Receiver::gc`].
    pub fn gc(&self, conn: &ConnectionId) -> Result<usize> {
        self.receiver(conn).gc()
    }

    /// Return every connection of `local` that is either remembered in the
    /// state store or has pending inbound traffic in the storage.
    ///
    /// The union covers both halves of reality: the state store knows
    /// connections that have exchanged traffic before (even fully drained
    /// ones), the scan finds peers that wrote to us before we ever answered.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    pub fn discover(&self, local: &Address) -> Result<BTreeSet<ConnectionId>> {
        let mut found = Discovery::new(Arc::clone(&self.storage)).scan(local)?;

        for id in self.state.list()? {
            if &id.local == local {
                found.insert(id);
            }
        }

        Ok(found)
    }

    /// Return every connection known to this endpoint across all of its
    /// local addresses: the state store's entries plus a storage scan for
    /// each local address appearing in them.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    pub fn discover_all(&self) -> Result<BTreeSet<ConnectionId>> {
        let known = self.state.list()?;

        let locals: BTreeSet<Address> = known.iter().map(|id| id.local.clone()).collect();

        let mut found: BTreeSet<ConnectionId> = known.into_iter().collect();
        for local in &locals {
            found.append(&mut self.discover(local)?);
        }

        Ok(found)
    }

    /// Wipe `conn`: every stored message of both directions, then the local
    /// state entry.
    ///
    /// Deletion loops to a fixpoint because a peer may write between the
    /// listing and the deletes; each pass re-lists until one finds nothing
    /// to delete. A peer that keeps sending concurrently can prolong the
    /// loop, and its messages to a destroyed connection are lost by
    /// definition.
    ///
    /// Not idempotent in effect (the counters are gone, and a recreated
    /// connection restarts at 0 while the peer's view does not), but
    /// re-runnable on error: the state entry is cleared last, so a failed
    /// call may simply be repeated.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure; state is untouched until
    /// all blobs are gone.
    pub fn destroy(&self, conn: &ConnectionId) -> Result<()> {
        loop {
            let mut deleted = 0usize;

            for name in self.storage.list()? {
                let Ok(header) = MessageHeader::decode(&name) else {
                    continue; // foreign entry
                };

                let outbound = header.sender() == &conn.local && header.receiver() == &conn.remote;
                let inbound = header.sender() == &conn.remote && header.receiver() == &conn.local;

                if outbound || inbound {
                    self.storage.delete(&name)?;
                    deleted += 1;
                }
            }

            if deleted == 0 {
                break;
            }
        }

        self.state.remove(conn)?;

        tracing::debug!(conn = ?conn, "connection destroyed");

        Ok(())
    }

    fn sender(&self, conn: &ConnectionId) -> Sender {
        Sender::new(conn.clone(), Arc::clone(&self.storage), Arc::clone(&self.state))
    }

    fn receiver(&self, conn: &ConnectionId) -> Receiver {
        Receiver::new(conn.clone(), Arc::clone(&self.storage), Arc::clone(&self.state))
    }
}
