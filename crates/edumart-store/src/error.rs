//! Error types for edumart storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An insert hit an existing key (unique constraint).
    #[error("key already exists in {table}")]
    Conflict {
        /// Table holding the key.
        table: &'static str,
    },

    /// A compare-and-put found different bytes than expected.
    #[error("stale write to {table}")]
    StaleWrite {
        /// Table holding the key.
        table: &'static str,
    },
}
