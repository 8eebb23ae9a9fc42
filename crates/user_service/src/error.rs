//! User service error types.

use thiserror::Error;

/// User service error type.
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Password hashing failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Result type for user service operations.
pub type Result<T> = std::result::Result<T, UserServiceError>;
