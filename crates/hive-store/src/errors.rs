//! Store error hierarchy.

use thiserror::Error;

/// Errors surfaced by store implementations.
///
/// All of these are transient from the coordination layer's point of view:
/// callers treat a failed query as "no data this cycle," never as fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or broken.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A persisted row no longer round-trips (e.g. unknown kind string).
    #[error("corrupt row {id}: {reason}")]
    Corrupt {
        /// Offending row id.
        id: String,
        /// What failed to parse.
        reason: String,
    },

    /// The store could not be reached (remote implementations).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
