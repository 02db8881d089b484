//! Error types for the CellGrid state store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open state store: {0}")]
    Open(String),

    /// A redb transaction, table, read, or write step failed.
    #[error("storage error during {op}: {reason}")]
    Storage { op: &'static str, reason: String },

    #[error("failed to encode {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to decode {key}: {reason}")]
    Decode { key: String, reason: String },
}
