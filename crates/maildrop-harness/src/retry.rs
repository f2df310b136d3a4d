//! Retry loop for operations over a transiently failing storage.
//!
//! The protocol never retries internally: every failed operation leaves
//! state untouched and surfaces its error, and the caller is expected to
//! wrap calls in a loop like this one. Tests use a bounded attempt budget
//! instead of backoff because injected faults need no pacing.

use maildrop_core::StorageError;

/// Call `op` until it succeeds, up to `max_attempts` times.
///
/// Returns the first success, or the last error once the budget is
/// exhausted. A zero budget fails without calling `op`.
///
/// # Errors
///
/// Returns the final [`StorageError`] after `max_attempts` failures.
pub fn retry<T>(
    max_attempts: u64,
    mut op: impl FnMut() -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let mut last = StorageError::Io("retry budget is zero".to_string());

    for _ in 0..max_attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => last = e,
        }
    }

    Err(last)
}
