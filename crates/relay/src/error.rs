//! Relay error types.

use thiserror::Error;

/// Relay error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Redis cache error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Durable store error.
    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Broadcast bus error.
    #[error("bus error: {0}")]
    Bus(#[from] bus::BusError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token failed signature or expiry validation.
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Token validated but its claims are unusable.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The connection handshake failed; terminal for the connection.
    #[error("handshake error: {0}")]
    Handshake(String),

    /// An inbound frame violated the protocol; the frame is dropped.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A call to a backing service exceeded its deadline.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Channel send error.
    #[error("channel send error")]
    ChannelSend,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
