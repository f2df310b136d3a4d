//! Inbound half of a connection.
//!
//! Read-only inspection and consuming delivery are distinct capabilities:
//!
//! - [`View`] (peek, pending) never mutates anything. [`Viewer`] vends only
//!   this capability.
//! - [`Receiver`] vends [`View`] plus consumption ([`Receiver::receive`],
//!   [`Receiver::receive_with`]) and garbage collection
//!   ([`Receiver::gc`]).
//!
//! # Ordering: read, commit, reclaim
//!
//! `receive` reads the blob named `(remote, local, rx)`, persists `rx + 1`,
//! and only then opportunistically garbage-collects. Advancing `rx` strictly
//! after the successful read is what makes every failure retryable without
//! loss: a crash between read and commit re-delivers the same message on the
//! next call, never skips one.
//!
//! # Garbage collection
//!
//! The receiver is the only party allowed to delete inbound entries, and it
//! deletes only those with counters strictly below its own consumed
//! watermark. That makes GC safe to interleave with a concurrently sending
//! peer (peers never delete their own outbound entries) and with a
//! concurrent `receive` (the next-to-be-received counter is never below the
//! watermark captured at the start of the pass).

use std::{collections::HashSet, sync::Arc};

use bytes::Bytes;
use maildrop_proto::MessageHeader;
use thiserror::Error;

use crate::{
    state::{ConnectionId, ConnectionState, StateStore},
    storage::{Result, Storage, StorageError},
};

/// Error from [`Receiver::receive_with`].
///
/// Distinguishes adapter failures from the caller's own handler failure; in
/// both cases `rx` has not advanced and the same message will be delivered
/// again.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeliveryError<E> {
    /// The storage or state backend failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller's handler rejected the message
    #[error("message handler failed")]
    Handler(E),
}

/// Read-only inspection of a connection's inbound direction.
pub trait View {
    /// Return the message at logical offset `rx + nth` if its blob exists.
    ///
    /// Pure read: never mutates counters or storage. `nth` of 0 is the next
    /// message [`Receiver::receive`] would deliver.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure; clean absence is
    /// `Ok(None)`.
    fn peek(&self, nth: u64) -> Result<Option<Bytes>>;

    /// Count messages available for consumption without a gap.
    ///
    /// Returns the smallest `k` such that the blob for counter `rx + k`
    /// does not exist, probed against a single listing snapshot. Messages
    /// beyond a gap are not counted even if present.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    fn pending(&self) -> Result<u64>;
}

/// Read-only handle on a connection's inbound direction.
pub struct Viewer {
    conn: ConnectionId,
    storage: Arc<dyn Storage>,
    state: Arc<dyn StateStore>,
}

impl Viewer {
    /// Create a viewer for `conn` over the given adapters.
    #[must_use]
    pub fn new(conn: ConnectionId, storage: Arc<dyn Storage>, state: Arc<dyn StateStore>) -> Self {
        Self { conn, storage, state }
    }

    /// The connection this viewer observes
    #[must_use]
    pub fn connection(&self) -> &ConnectionId {
        &self.conn
    }

    /// Entry name of the inbound message with the given counter.
    fn inbound_name(&self, counter: u64) -> Vec<u8> {
        MessageHeader::new(self.conn.remote.clone(), self.conn.local.clone(), counter).encode()
    }

    /// True if `header` names an inbound message of this connection.
    fn is_inbound(&self, header: &MessageHeader) -> bool {
        header.sender() == &self.conn.remote && header.receiver() == &self.conn.local
    }
}

impl View for Viewer {
    fn peek(&self, nth: u64) -> Result<Option<Bytes>> {
        let s = self.state.load(&self.conn)?;

        let Some(counter) = s.rx.checked_add(nth) else {
            return Ok(None);
        };

        match self.storage.read(&self.inbound_name(counter)) {
            Ok(message) => Ok(Some(message)),
            Err(StorageError::NoSuchEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn pending(&self) -> Result<u64> {
        let s = self.state.load(&self.conn)?;

        // One snapshot; probing with repeated reads would race a concurrent
        // sender into counting a gap as a message.
        let mut present = HashSet::new();
        for name in self.storage.list()? {
            let Ok(header) = MessageHeader::decode(&name) else {
                continue; // foreign entry
            };
            if self.is_inbound(&header) {
                present.insert(header.counter());
            }
        }

        let mut k = 0u64;
        while s.rx.checked_add(k).is_some_and(|c| present.contains(&c)) {
            k += 1;
        }

        Ok(k)
    }
}

/// Consuming handle on a connection's inbound direction.
///
/// Concurrent consuming calls on the same connection must be externally
/// serialized (they contend on `rx`); a concurrent send on the same
/// connection needs no coordination.
pub struct Receiver {
    view: Viewer,
}

impl Receiver {
    /// Create a receiver for `conn` over the given adapters.
    #[must_use]
    pub fn new(conn: ConnectionId, storage: Arc<dyn Storage>, state: Arc<dyn StateStore>) -> Self {
        Self { view: Viewer::new(conn, storage, state) }
    }

    /// The connection this receiver consumes from
    #[must_use]
    pub fn connection(&self) -> &ConnectionId {
        self.view.connection()
    }

    /// Fetch and consume the next inbound message.
    ///
    /// Returns `Ok(None)` when the next message has not arrived; `rx` does
    /// not move. On success `rx` advances by 1 and a garbage-collection
    /// pass runs opportunistically, its error swallowed (the message is
    /// already consumed and GC is re-runnable at any time).
    ///
    /// # Errors
    ///
    /// Returns the storage error verbatim on backend failure. On error
    /// nothing has advanced and the call may simply be repeated.
    pub fn receive(&self) -> Result<Option<Bytes>> {
        let s = self.view.state.load(&self.view.conn)?;

        let message = match self.view.storage.read(&self.view.inbound_name(s.rx)) {
            Ok(message) => message,
            Err(StorageError::NoSuchEntry) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.commit_consumed(s)?;

        if let Err(e) = self.gc() {
            tracing::debug!(
                conn = ?self.view.conn,
                error = %e,
                "opportunistic gc failed; next receive will retry"
            );
        }

        Ok(Some(message))
    }

    /// Consume the next inbound message through a caller-side handler.
    ///
    /// Runs `f` on the message **before** advancing `rx`: the counter moves
    /// iff `f` returned success. A failing handler sees the exact same
    /// bytes again on every retry until it succeeds, which gives
    /// exactly-once delivery with respect to the handler's side effects.
    ///
    /// # Errors
    ///
    /// [`DeliveryError::Storage`] on backend failure,
    /// [`DeliveryError::Handler`] when `f` fails. Either way `rx` has not
    /// advanced.
    pub fn receive_with<T, E, F>(&self, f: F) -> std::result::Result<Option<T>, DeliveryError<E>>
    where
        F: FnOnce(&Bytes) -> std::result::Result<T, E>,
    {
        let s = self.view.state.load(&self.view.conn)?;

        let message = match self.view.storage.read(&self.view.inbound_name(s.rx)) {
            Ok(message) => message,
            Err(StorageError::NoSuchEntry) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = f(&message).map_err(DeliveryError::Handler)?;

        self.commit_consumed(s)?;

        if let Err(e) = self.gc() {
            tracing::debug!(
                conn = ?self.view.conn,
                error = %e,
                "opportunistic gc failed; next receive will retry"
            );
        }

        Ok(Some(value))
    }

    /// Delete consumed inbound entries.
    ///
    /// Captures `rx`, takes a fresh listing, and deletes every entry whose
    /// name decodes to an inbound header of this connection with a counter
    /// strictly below the captured watermark. Foreign entries, outbound
    /// entries, and anything at or above the watermark are left alone.
    ///
    /// Idempotent: a second pass finds nothing left to delete. Returns the
    /// number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure. The pass aborts on the
    /// first failed delete; the entries that remain are all still below the
    /// watermark, so any later pass finishes the work.
    pub fn gc(&self) -> Result<usize> {
        let watermark = self.view.state.load(&self.view.conn)?.rx;

        let mut removed = 0usize;
        for name in self.view.storage.list()? {
            let Ok(header) = MessageHeader::decode(&name) else {
                continue; // foreign entry
            };

            if !self.view.is_inbound(&header) || header.counter() >= watermark {
                continue;
            }

            self.view.storage.delete(&name)?;
            removed += 1;
        }

        if removed > 0 {
            tracing::debug!(conn = ?self.view.conn, removed, "reclaimed consumed entries");
        }

        Ok(removed)
    }

    /// Persist `rx + 1` after a successful read.
    fn commit_consumed(&self, s: ConnectionState) -> Result<()> {
        let rx = s.rx.checked_add(1).ok_or_else(|| {
            StorageError::Io(format!("rx counter overflow on {:?}", self.view.conn))
        })?;

        self.view.state.store(&self.view.conn, ConnectionState { rx, tx: s.tx })
    }
}

impl View for Receiver {
    fn peek(&self, nth: u64) -> Result<Option<Bytes>> {
        self.view.peek(nth)
    }

    fn pending(&self) -> Result<u64> {
        self.view.pending()
    }
}
