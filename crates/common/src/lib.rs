//! Common types shared by the message relay services.

pub mod claims;
pub mod event;

pub use claims::TokenClaims;
pub use event::{MessageEvent, DEFAULT_BUS_CHANNEL};
