//! Notifier error types.

use thiserror::Error;

/// Notifier error type.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// HTTP transport error talking to the email API.
    #[error("email request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email API answered with a non-success status.
    #[error("email API returned status {status}: {body}")]
    EmailApi { status: u16, body: String },
}

/// Result type for notifier operations.
pub type Result<T> = std::result::Result<T, NotifierError>;
