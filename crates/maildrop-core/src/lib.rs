//! Maildrop protocol core logic
//!
//! This crate implements ordered, reliable, exactly-once message streams
//! between endpoints that share nothing but a dumb blob store. There is no
//! lock service, no rendezvous server, and no clock: the storage's
//! atomic-replace contract is the only synchronization primitive.
//!
//! # Architecture: ownership discipline instead of locking
//!
//! ```text
//!      ┌─────────────────────────────┐
//!      │ maildrop-core               │
//!      │ - Sender / Receiver         │
//!      │ - Discovery / Socket        │
//!      │ - Counter state             │
//!      └─────────────────────────────┘
//!          ↓                   ↓
//! ┌────────────────┐  ┌────────────────┐
//! │ Storage        │  │ StateStore     │
//! │ (shared blobs) │  │ (local, per    │
//! │ cloud / IMAP / │  │  endpoint)     │
//! │ fs / in-memory │  │                │
//! └────────────────┘  └────────────────┘
//! ```
//!
//! Every message blob is named by its canonical header `(sender, receiver,
//! counter)`. For each such name, exactly one endpoint may ever write it
//! (the sender) and exactly one may ever delete it (the receiver, after
//! consuming it). These two disjoint permissions remove any need for
//! coordination at the storage layer, even with many endpoints sharing one
//! store.
//!
//! # Key Principles
//!
//! - **Idempotent on error**: every mutating operation performs its storage
//!   mutation before its counter commit. A failure at any step leaves both
//!   storage and counters observably unchanged, so callers retry freely.
//! - **Synchronous**: no runtime, no spawned threads. Callers may drive
//!   endpoints from as many OS threads as they like, provided a single
//!   `(connection, direction)` pair is touched by one thread at a time.
//! - **Errors surface immediately**: the core never retries internally and
//!   never recovers locally from a storage error, with one documented
//!   exception (opportunistic GC after a successful receive).
//!
//! # Modules
//!
//! - [`storage`]: blob store capability trait and in-memory implementation
//! - [`state`]: per-connection counter pairs and their persistence trait
//! - [`sender`]: outbound half of a connection
//! - [`receiver`]: inbound half (peek, consume, garbage-collect)
//! - [`discovery`]: finding peers with pending traffic
//! - [`socket`]: per-endpoint facade composing the above

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod discovery;
pub mod receiver;
pub mod sender;
pub mod socket;
pub mod state;
pub mod storage;

pub use discovery::Discovery;
pub use receiver::{DeliveryError, Receiver, View, Viewer};
pub use sender::Sender;
pub use socket::Socket;
pub use state::{ConnectionId, ConnectionState, MemoryStateStore, StateStore};
pub use storage::{MemoryStorage, Result, Storage, StorageError};
