//! Coordination error hierarchy.

use thiserror::Error;

use hive_store::StoreError;

/// Errors surfaced by the coordination core.
///
/// Nothing here is fatal to the hosting process: callers treat every
/// variant as "this signal is temporarily unavailable" and move on.
#[derive(Debug, Error)]
pub enum CoordError {
    /// The shared log was unreachable or returned a failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result alias for coordination operations.
pub type Result<T> = std::result::Result<T, CoordError>;
