//! Storage error conditions.

use thiserror::Error;

/// Conditions a [`Store`](super::Store) reports.
///
/// Each string names the violated constraint or failing column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unique constraint violated.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Foreign key violated.
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    /// A numeric value does not fit its column.
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Serialization failure or lost update; the transaction may be retried.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Anything else the backend reports.
    #[error("Backend error: {0}")]
    Backend(String),
}
