//! Error types for the RegretGraph core library.

use thiserror::Error;

use crate::types::NodeId;

/// Top-level error type for all graph-engine operations.
#[derive(Error, Debug)]
pub enum RegretError {
    /// A node with the given id does not exist (never existed, or was forgotten).
    #[error("Memory node not found: {0}")]
    NodeNotFound(NodeId),

    /// Caller-supplied input was out of range or malformed. Nothing was mutated.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Snapshot encoding/decoding failure, including corrupt or incompatible blobs.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for RegretError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RegretError>;
