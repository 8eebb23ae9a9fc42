//! Error types for the storage crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database connect timed out after {0}s")]
    ConnectTimeout(u64),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
