//! Message header codec.
//!
//! A [`MessageHeader`] is the triple `(sender, receiver, counter)`. Its
//! canonical encoding is the storage entry name under which the message
//! body is written, so the codec is the single addressing primitive of the
//! whole protocol.
//!
//! # Encoding
//!
//! A strict tag-length-value sequence with a fixed field order:
//!
//! ```text
//! 0x01 <len> <sender bytes>      len in 1..=24
//! 0x02 <len> <receiver bytes>    len in 1..=24
//! 0x03 0x08  <counter>           8 bytes, big endian
//! ```
//!
//! The decoder accepts exactly this form and nothing else: wrong tag order,
//! out-of-range lengths, and trailing bytes are all rejected. That gives the
//! two properties the protocol relies on:
//!
//! - `decode(encode(h)) == h` for every representable header
//! - `encode` is injective, so distinct messages never collide on a name
//!
//! # Invariants
//!
//! - **Bounded**: the encoding is at most [`MessageHeader::MAX_ENCODED_LEN`]
//!   (62) bytes; the printable rendering is at most 83 characters. Both are
//!   within the 100-byte entry name limit of the storage adapters.
//!
//! - **Foreign entries**: a shared store may hold entries that are not
//!   maildrop messages. Decoding such names fails with a structured error,
//!   and listings skip them silently.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    address::Address,
    errors::{DecodeError, Result},
};

/// Field tag for the sender address
const TAG_SENDER: u8 = 0x01;

/// Field tag for the receiver address
const TAG_RECEIVER: u8 = 0x02;

/// Field tag for the message counter
const TAG_COUNTER: u8 = 0x03;

/// Encoded length of the counter field payload
const COUNTER_LEN: u8 = 8;

/// The unique name of a single message blob.
///
/// Directionality is significant: `(A, B, n)` names the n-th message from A
/// to B, never the reverse. Counters start at 0 and increase by 1 per
/// message on each direction independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    sender: Address,
    receiver: Address,
    counter: u64,
}

impl MessageHeader {
    /// Maximum encoded length in bytes (two 24-byte addresses plus counter)
    pub const MAX_ENCODED_LEN: usize = 2 + Address::MAX_LEN + 2 + Address::MAX_LEN + 2 + 8;

    /// Create a header naming the `counter`-th message from `sender` to
    /// `receiver`.
    #[must_use]
    pub fn new(sender: Address, receiver: Address, counter: u64) -> Self {
        Self { sender, receiver, counter }
    }

    /// Get the sending endpoint
    #[must_use]
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Get the receiving endpoint
    #[must_use]
    pub fn receiver(&self) -> &Address {
        &self.receiver
    }

    /// Get the message counter
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Encode to the canonical entry name.
    ///
    /// Pure and total: every header has exactly one encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut name = Vec::with_capacity(Self::MAX_ENCODED_LEN);

        name.push(TAG_SENDER);
        name.push(self.sender.as_bytes().len() as u8);
        name.extend_from_slice(self.sender.as_bytes());

        name.push(TAG_RECEIVER);
        name.push(self.receiver.as_bytes().len() as u8);
        name.extend_from_slice(self.receiver.as_bytes());

        name.push(TAG_COUNTER);
        name.push(COUNTER_LEN);
        name.extend_from_slice(&self.counter.to_be_bytes());

        debug_assert!(name.len() <= Self::MAX_ENCODED_LEN);

        name
    }

    /// Decode a canonical entry name.
    ///
    /// Strict: accepts only the exact output of [`MessageHeader::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for any name that is not the canonical
    /// encoding of some header. Foreign entries sharing the store decode to
    /// errors, never to bogus headers.
    pub fn decode(name: &[u8]) -> Result<Self> {
        let mut pos = 0usize;

        let sender = decode_address(name, &mut pos, TAG_SENDER)?;
        let receiver = decode_address(name, &mut pos, TAG_RECEIVER)?;
        let counter = decode_counter(name, &mut pos)?;

        if pos != name.len() {
            return Err(DecodeError::TrailingBytes(name.len() - pos));
        }

        Ok(Self { sender, receiver, counter })
    }

    /// Render the entry name printable for storages that cannot take raw
    /// byte names (URL-safe base64, no padding).
    #[must_use]
    pub fn printable(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.encode())
    }

    /// Decode a printable entry name produced by
    /// [`MessageHeader::printable`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::BadBase64`] for invalid base64, or any
    /// [`MessageHeader::decode`] error for a well-formed but non-canonical
    /// payload.
    pub fn decode_printable(name: &str) -> Result<Self> {
        let raw = URL_SAFE_NO_PAD.decode(name).map_err(|_| DecodeError::BadBase64)?;
        Self::decode(&raw)
    }
}

/// Decode one tagged address field at `pos`, advancing the cursor.
fn decode_address(name: &[u8], pos: &mut usize, tag: u8) -> Result<Address> {
    // Tag byte plus length byte must be present.
    if name.len() < *pos + 2 {
        return Err(DecodeError::Truncated { expected: *pos + 2, actual: name.len() });
    }

    if name[*pos] != tag {
        return Err(DecodeError::UnexpectedTag { expected: tag, actual: name[*pos] });
    }

    let len = name[*pos + 1] as usize;
    if len == 0 || len > Address::MAX_LEN {
        return Err(DecodeError::BadAddressLength(len));
    }

    let start = *pos + 2;
    let end = start + len;
    if name.len() < end {
        return Err(DecodeError::Truncated { expected: end, actual: name.len() });
    }

    *pos = end;

    Address::predefined(&name[start..end])
}

/// Decode the tagged counter field at `pos`, advancing the cursor.
fn decode_counter(name: &[u8], pos: &mut usize) -> Result<u64> {
    if name.len() < *pos + 2 {
        return Err(DecodeError::Truncated { expected: *pos + 2, actual: name.len() });
    }

    if name[*pos] != TAG_COUNTER {
        return Err(DecodeError::UnexpectedTag { expected: TAG_COUNTER, actual: name[*pos] });
    }

    if name[*pos + 1] != COUNTER_LEN {
        return Err(DecodeError::BadCounterLength(name[*pos + 1]));
    }

    let start = *pos + 2;
    let end = start + COUNTER_LEN as usize;
    if name.len() < end {
        return Err(DecodeError::Truncated { expected: end, actual: name.len() });
    }

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&name[start..end]);

    *pos = end;

    Ok(u64::from_be_bytes(bytes))
}
