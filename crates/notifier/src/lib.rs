//! Email notification service.
//!
//! Subscribes to new-message events on the bus and emails each receiver
//! through an HTTP delivery API.

pub mod api;
pub mod email;
pub mod error;
pub mod service;

pub use api::create_router;
pub use email::EmailClient;
pub use error::{NotifierError, Result};
pub use service::{NotifierConfig, NotifierService};
