//! User account service.
//!
//! HTTP API for registration and login. Issues the JWTs the relay
//! accepts during its WebSocket handshake.

pub mod api;
pub mod auth;
pub mod error;

pub use api::{create_router, AppState};
pub use auth::{hash_password, verify_password, TokenIssuer};
pub use error::{Result, UserServiceError};
