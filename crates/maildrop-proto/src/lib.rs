//! # Maildrop Protocol: Entry Naming
//!
//! This crate implements the naming layer for the maildrop storage-backed
//! messaging protocol.
//!
//! ## Protocol Design
//!
//! Maildrop exchanges messages through a dumb blob store that supports only
//! list/read/atomic-write/delete. There is no wire, no framing, and no
//! session handshake: the complete state of a connection is the set of
//! entries whose *names* decode as message headers. A header is the triple
//! `(sender, receiver, counter)`, and its canonical byte encoding IS the
//! storage entry name of that message.
//!
//! Because names carry all routing information, the encoding must be:
//!
//! - **Canonical**: equal headers always produce byte-identical names
//! - **Injective**: distinct headers always produce distinct names
//! - **Self-describing**: a name decodes without side information
//! - **Bounded**: at most [`MessageHeader::MAX_ENCODED_LEN`] bytes, well
//!   under the 100-byte name limit of the storage adapters
//!
//! ## Implementation Notes
//!
//! - **Tag-length-value encoding**: Addresses are variable length (1 to 24
//!   bytes), so the name is a strict TLV sequence with a fixed field order.
//!   The decoder rejects anything that is not the exact canonical form,
//!   which makes `decode(encode(h)) == h` hold for every header and lets
//!   listings safely skip foreign entries that share the store.
//!
//! - **Printable names**: Storages that cannot take raw byte names (IMAP
//!   folders, some cloud APIs) use the URL-safe unpadded base64 rendering
//!   from [`MessageHeader::printable`]. Binary-capable adapters pass the raw
//!   encoding through.
//!
//! ## Security Properties
//!
//! - **No unsafe parsing**: decoding is bounds-checked slicing over the
//!   input; malformed names are rejected with a structured error before any
//!   value is constructed.
//!
//! - **Explicit validation**: all constructors validate invariants and
//!   return `Result`. There are no "unchecked" fast paths.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod errors;
pub mod header;

pub use address::Address;
pub use errors::{DecodeError, Result};
pub use header::MessageHeader;
