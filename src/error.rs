//! Error types for Depot.

use thiserror::Error;

/// Common error type for Depot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (backup manifest encoding/decoding).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for Depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;
