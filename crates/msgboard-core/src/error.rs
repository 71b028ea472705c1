//! Centralized error types for msgboard.

use thiserror::Error;

/// Main error type for board operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// A required request parameter is missing or malformed.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Content was rejected before reaching storage.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// The after-save broadcast failed and the save was rolled back.
    #[error("Broadcast error: {0}")]
    Broadcast(#[from] msgboard_cable::CableError),

    #[error("Database error: {0}")]
    Database(#[from] msgboard_db::DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    /// Create a parameter error.
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::ParameterError(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
