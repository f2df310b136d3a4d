//! Deterministic fault-injection harness for maildrop protocol testing.
//!
//! This crate provides storage wrappers that fail on purpose, plus the
//! retry helper the protocol's callers are expected to bring. Together they
//! let the end-to-end tests exercise the protocol's central promise: every
//! mutating operation is idempotent on error, so a retry loop over a
//! transiently failing storage converges to the same state as a run over a
//! perfect one.
//!
//! The core is synchronous and runtime-free, so multi-endpoint scenarios
//! are driven by plain OS threads sharing one
//! [`maildrop_core::MemoryStorage`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod retry;

pub use fault::{FaultyStorage, FlakyStorage};
pub use retry::retry;
