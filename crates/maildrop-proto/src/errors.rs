//! Error types for the maildrop naming codec.
//!
//! All errors are structured, testable, and provide actionable information.
//!
//! A shared blob store routinely contains entries written by other users.
//! Callers that iterate a storage listing treat any [`DecodeError`] as "not
//! one of ours" and silently skip the entry; the error therefore never
//! crosses the protocol's public boundary.

use thiserror::Error;

/// Errors that can occur while decoding a storage entry name into a header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Name ended before the announced field did
    #[error("name truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum length the field structure requires
        expected: usize,
        /// Actual length available
        actual: usize,
    },

    /// A field tag was missing, unknown, or out of canonical order
    #[error("unexpected tag: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedTag {
        /// Tag required at this position
        expected: u8,
        /// Tag actually present
        actual: u8,
    },

    /// Address length outside the valid 1..=24 range
    #[error("bad address length: {0}")]
    BadAddressLength(usize),

    /// Counter field length was not exactly 8 bytes
    #[error("bad counter length: {0}")]
    BadCounterLength(u8),

    /// Bytes remained after the final field
    #[error("{0} trailing bytes after header")]
    TrailingBytes(usize),

    /// Printable name was not valid URL-safe base64
    #[error("invalid base64 in printable name")]
    BadBase64,
}

/// Convenient Result type alias for codec operations
pub type Result<T> = std::result::Result<T, DecodeError>;
