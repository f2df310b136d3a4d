//! Endpoint addresses.
//!
//! An [`Address`] identifies one protocol endpoint. It is an opaque byte
//! string of 1 to 24 bytes; the protocol never interprets the content.
//!
//! Two construction modes exist:
//!
//! - [`Address::random`]: 24 bytes from the OS entropy pool. Collision
//!   probability is negligible, so random addresses need no coordination.
//! - [`Address::predefined`]: caller-supplied bytes. The caller owns
//!   uniqueness (useful for stable, human-assigned endpoint names).
//!
//! Equality, ordering, and hashing are over the raw bytes. Addresses are
//! immutable after construction.

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use crate::errors::{DecodeError, Result};

/// Opaque identifier of a protocol endpoint.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    bytes: Vec<u8>,
}

impl Address {
    /// Maximum address length in bytes
    pub const MAX_LEN: usize = 24;

    /// Length of randomly generated addresses
    pub const RANDOM_LEN: usize = 24;

    /// Create a cryptographically random address.
    ///
    /// Uses the OS entropy pool directly. Identity material must never come
    /// from a non-secure generator, so there is no `thread_rng` variant.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes = vec![0u8; Self::RANDOM_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a random address from a caller-supplied generator.
    ///
    /// Test harnesses pass a seeded RNG here so that endpoint identities are
    /// reproducible across runs. Production code should use
    /// [`Address::random`].
    #[must_use]
    pub fn random_with(rng: &mut impl RngCore) -> Self {
        let mut bytes = vec![0u8; Self::RANDOM_LEN];
        rng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create an address from caller-supplied bytes.
    ///
    /// The caller is responsible for uniqueness across the shared storage.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::BadAddressLength`] if `bytes` is empty or
    /// longer than [`Address::MAX_LEN`].
    pub fn predefined(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        if bytes.is_empty() || bytes.len() > Self::MAX_LEN {
            return Err(DecodeError::BadAddressLength(bytes.len()));
        }

        Ok(Self { bytes })
    }

    /// Raw address bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// Manual Debug keeps log lines short: full addresses are 48 hex chars.
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(")?;
        for byte in self.bytes.iter().take(4) {
            write!(f, "{:02x}", byte)?;
        }
        if self.bytes.len() > 4 {
            write!(f, "..")?;
        }
        write!(f, ")")
    }
}
