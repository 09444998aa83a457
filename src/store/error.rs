//! Store lookup errors

use std::fmt;

/// Errors that a lookup can surface to the verification layer
///
/// Both are non-fatal and returned directly to the caller; the store
/// never retries internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No entry exists for the given id (never set, already consumed,
    /// overwritten away, or swept)
    NotFound,

    /// An entry exists but its expiration time has passed
    Expired,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Answer not found"),
            StoreError::Expired => write!(f, "Answer has expired"),
        }
    }
}

impl std::error::Error for StoreError {}
