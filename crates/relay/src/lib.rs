//! Real-time chat relay over WebSockets.
//!
//! This service:
//! - Accepts WebSocket connections at `/chat`, authenticating the first frame
//! - Replays each client's recent history from Redis, falling back to Postgres
//! - Persists, caches and publishes every inbound message
//! - Delivers messages live to connected receivers
//!
//! ## Architecture
//!
//! ```text
//! WebSocket clients
//!         ↓ auth frame, then message frames
//! Session (one task per connection)
//!         ↓
//! MessagePipeline
//!    ├── Postgres messages table (durable log)
//!    ├── Redis list chat:<identity> (recent history, capped)
//!    ├── Redis pub/sub new_message (downstream consumers)
//!    └── ClientRegistry (DashMap-based live delivery)
//! ```
//!
//! Live delivery and the outbound wire format never carry the sender;
//! only the durable log and the pub/sub event do.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod protocol;
pub mod traits;
pub mod ws_server;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::TokenVerifier;
pub use cache::MessageCache;
pub use client::{ClientHandle, ClientRegistry};
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use pipeline::MessagePipeline;
pub use protocol::{ClientFrame, RelayedMessage, ServerFrame};
pub use traits::{EventPublisher, HistoryCache, HistoryStore};
pub use ws_server::{create_router, AppState};
