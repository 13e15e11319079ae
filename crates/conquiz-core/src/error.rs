//! Domain error types.

use thiserror::Error;

/// Infrastructure-level error shared by every port.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate or entity was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure error (storage, broker, remote service).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
