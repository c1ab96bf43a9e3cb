//! Error types for Delve.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the write because it would exceed its quota
    #[error("Storage quota exceeded: need {needed} bytes, limit {limit}")]
    QuotaExceeded {
        /// Bytes the store would hold after the write
        needed: usize,
        /// Configured byte limit
        limit: usize,
    },
}

/// World and chunk persistence errors.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored value failed to parse
    #[error("Corrupt record under {key}: {reason}")]
    Corrupt {
        /// Storage key
        key: String,
        /// Parser message
        reason: String,
    },

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
