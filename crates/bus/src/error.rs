//! Error types for the bus crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("bus connect timed out after {0}s")]
    ConnectTimeout(u64),
}

pub type Result<T> = std::result::Result<T, BusError>;
