//! Connected-client state and the identity routing registry.
//!
//! Uses DashMap so session tasks can route to receivers without a global
//! lock; guards are held only for the map operation itself, never across
//! I/O.

use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Buffer size for per-client outbound channels.
pub const CLIENT_CHANNEL_BUFFER_SIZE: usize = 256;

/// Handle to a single authenticated connection.
pub struct ClientHandle {
    /// Identity that authenticated this connection.
    pub identity: String,
    /// Distinguishes this connection from a later one for the same identity.
    pub conn_id: Uuid,
    /// Outbound frames, drained into the socket by the writer task.
    pub tx: mpsc::Sender<Message>,
    /// Signals the owning session loop to close.
    close_tx: mpsc::Sender<()>,
}

impl ClientHandle {
    /// Create a handle with a fresh connection id.
    pub fn new(
        identity: impl Into<String>,
        tx: mpsc::Sender<Message>,
        close_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            identity: identity.into(),
            conn_id: Uuid::new_v4(),
            tx,
            close_tx,
        }
    }

    /// Queue a message without blocking.
    ///
    /// Returns false when the buffer is full (slow client) or the writer
    /// task is gone.
    pub fn try_send_raw(&self, msg: Message) -> bool {
        self.tx.try_send(msg).is_ok()
    }

    /// Ask the owning session to close (used when a newer login for the
    /// same identity supersedes this connection).
    pub fn request_close(&self) {
        let _ = self.close_tx.try_send(());
    }
}

/// Registry of connected clients, keyed by identity.
///
/// At most one entry per identity: a new login replaces the old entry and
/// the superseded session is asked to close itself.
pub struct ClientRegistry {
    clients: DashMap<String, Arc<ClientHandle>>,
}

impl ClientRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a client, returning the handle it replaced, if any.
    pub fn register(&self, client: Arc<ClientHandle>) -> Option<Arc<ClientHandle>> {
        let replaced = self.clients.insert(client.identity.clone(), client.clone());
        if replaced.is_some() {
            info!(
                "Client {} reconnected, superseding previous connection",
                client.identity
            );
        } else {
            info!("Client {} registered", client.identity);
        }
        replaced
    }

    /// Remove an identity's entry, but only while it still belongs to
    /// `conn_id`. A session tearing down after being superseded must not
    /// evict its replacement.
    pub fn unregister(&self, identity: &str, conn_id: Uuid) {
        let removed = self
            .clients
            .remove_if(identity, |_, existing| existing.conn_id == conn_id);
        if removed.is_some() {
            info!("Client {} unregistered", identity);
        } else {
            debug!("Client {} already superseded, keeping newer entry", identity);
        }
    }

    /// Look up the live connection for an identity.
    pub fn get(&self, identity: &str) -> Option<Arc<ClientHandle>> {
        self.clients.get(identity).map(|r| r.clone())
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
