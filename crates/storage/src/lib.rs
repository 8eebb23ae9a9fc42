//! PostgreSQL persistence for messages and user accounts.
//!
//! The durable system of record behind the relay: the relay writes every
//! message here and falls back to it when the history cache is cold, the
//! user service keeps accounts here, and the notifier resolves receiver
//! email addresses through it.

pub mod error;
pub mod messages;
pub mod pool;
pub mod users;

pub use error::{Result, StorageError};
pub use messages::{MessageStore, StoredMessage};
pub use pool::{connect, ensure_schema};
pub use users::{User, UserStore};
