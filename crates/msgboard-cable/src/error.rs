//! Broadcast transport errors.

use std::time::Duration;
use thiserror::Error;

/// Broadcast error types.
#[derive(Error, Debug)]
pub enum CableError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP relay error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay rejected broadcast with status {0}")]
    Rejected(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broadcast timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Result type for broadcast operations.
pub type CableResult<T> = Result<T, CableError>;
