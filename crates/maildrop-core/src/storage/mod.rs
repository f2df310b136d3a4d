//! Blob storage abstraction.
//!
//! The [`Storage`] trait is the narrow capability interface the protocol
//! consumes. A backend must support exactly four operations over entries
//! keyed by short byte names: list, read, atomic write, delete. Real
//! adapters exist for cloud folders, IMAP mailboxes, and filesystems; the
//! in-memory implementation here backs tests and the fault-injection
//! harness.
//!
//! # Contract
//!
//! - `write` is an atomic create-or-replace: after a failure the entry holds
//!   either its old value or the new one, never a torn mixture.
//! - `list` is a consistent snapshot at the granularity of a single call.
//!   Entries may appear or disappear between calls.
//! - `delete` of an absent entry is not an error.
//! - Every operation may block arbitrarily long and may fail transiently.
//!   The protocol surfaces such failures verbatim and leaves its own state
//!   untouched, so callers retry the whole operation.
//!
//! Entry names are at most 100 bytes. Adapters that require printable names
//! store the URL-safe base64 rendering of the name and reverse it on
//! `list`; binary-capable adapters pass raw bytes through.

use bytes::Bytes;
use thiserror::Error;

mod memory;

pub use memory::MemoryStorage;

/// Errors surfaced by a storage backend.
///
/// The protocol propagates these verbatim: it never retries internally and
/// never maps one variant to another.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The named entry does not exist
    #[error("no such entry")]
    NoSuchEntry,

    /// The backend failed (network, quota, permission, ...)
    #[error("storage i/o error: {0}")]
    Io(String),
}

/// Convenient Result type alias for storage-facing operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Narrow capability interface over a shared blob store.
///
/// Implementations must be safe to share across threads; the protocol
/// itself never holds a lock across storage calls. Trait objects are the
/// expected usage (`Arc<dyn Storage>`): one adapter instance is shared by
/// every component of every local endpoint.
pub trait Storage: Send + Sync {
    /// Enumerate all entry names.
    ///
    /// The returned snapshot must be internally consistent, but entries may
    /// be created or deleted concurrently by other endpoints between calls.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on backend failure.
    fn list(&self) -> Result<Vec<Vec<u8>>>;

    /// Read the entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchEntry`] if absent, or
    /// [`StorageError::Io`] on backend failure.
    fn read(&self, name: &[u8]) -> Result<Bytes>;

    /// Atomically create or replace the entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on backend failure. After an error the
    /// entry holds either its previous value or `data`, never a torn value.
    fn write(&self, name: &[u8], data: Bytes) -> Result<()>;

    /// Remove the entry named `name`. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on backend failure.
    fn delete(&self, name: &[u8]) -> Result<()>;
}
