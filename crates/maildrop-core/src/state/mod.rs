//! Per-connection counter state and its persistence.
//!
//! Each endpoint tracks, per connection, how far both directions have
//! progressed: `tx` counts messages it has successfully written as sender,
//! `rx` counts messages it has successfully consumed as receiver. Those two
//! counters are the *only* local state of the protocol; everything else
//! lives in the shared blob store.
//!
//! # Lazy materialization
//!
//! A connection needs no setup step. Its first mention in any operation
//! simply loads the default `{rx: 0, tx: 0}` state: [`StateStore::load`]
//! returns the default for absent entries, and the entry is first written
//! when an operation commits. This is a semantic of the store, not of any
//! particular data structure.
//!
//! # Crash consistency
//!
//! The store must be crash-consistent at the granularity of a single
//! `(id, state)` write: a crashed write leaves either the old value or the
//! new, never a torn value. Nothing is required across connections. The
//! state backend is local to one endpoint and single-writer per connection,
//! so it needs no locking discipline beyond that.

use serde::{Deserialize, Serialize};

use maildrop_proto::Address;

use crate::storage::Result;

mod memory;

pub use memory::MemoryStateStore;

/// Directed identifier of a connection, as seen from one endpoint.
///
/// `(A, B)` and `(B, A)` are distinct values naming the same wire
/// connection viewed from its two ends. Equality, hashing, and ordering use
/// both fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId {
    /// The endpoint this view belongs to
    pub local: Address,
    /// The peer on the other end
    pub remote: Address,
}

impl ConnectionId {
    /// Create a connection identifier for the `local` endpoint talking to
    /// `remote`.
    #[must_use]
    pub fn new(local: Address, remote: Address) -> Self {
        Self { local, remote }
    }

    /// The same wire connection as seen from the peer.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self { local: self.remote.clone(), remote: self.local.clone() }
    }
}

/// Pair of monotonic per-connection counters.
///
/// Both counters begin at 0, increase by exactly 1 per successful
/// operation, and never decrease:
///
/// - `rx` is the number of inbound messages already consumed; equivalently
///   the counter of the *next* expected inbound message.
/// - `tx` is the number of outbound messages already written; equivalently
///   the counter of the *next* outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Inbound messages consumed so far
    pub rx: u64,
    /// Outbound messages written so far
    pub tx: u64,
}

/// Persistence capability for connection counters.
///
/// An absent entry is semantically `{rx: 0, tx: 0}`; [`StateStore::load`]
/// encodes that directly. Implementations must be crash-consistent per
/// single write (see the module docs) and safe to share across threads.
pub trait StateStore: Send + Sync {
    /// Enumerate connections that have persisted state.
    ///
    /// Connections that were only ever loaded (and never advanced) do not
    /// appear here.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    fn list(&self) -> Result<Vec<ConnectionId>>;

    /// Load the state for `id`, defaulting to `{0, 0}` when absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    fn load(&self, id: &ConnectionId) -> Result<ConnectionState>;

    /// Overwrite the state for `id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure. After an error the entry
    /// holds either the old state or `state`, never a torn value.
    fn store(&self, id: &ConnectionId, state: ConnectionState) -> Result<()>;

    /// Delete the state entry for `id`. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend failure.
    fn remove(&self, id: &ConnectionId) -> Result<()>;
}
