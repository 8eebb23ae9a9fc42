//! Redis-backed recent-message cache.
//!
//! One capped list per identity holding serialized outbound frames, newest
//! first. Subordinate to the durable store: losing it costs latency on the
//! next connect, never data.

use crate::error::Result;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::debug;

/// Redis key prefix for per-identity history lists: chat:{identity}
pub const HISTORY_KEY_PREFIX: &str = "chat:";

/// Shared Redis client wrapper for history list operations.
#[derive(Clone)]
pub struct MessageCache {
    client: Arc<redis::Client>,
}

impl MessageCache {
    /// Create a cache client. Connections are established lazily per call.
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Verify the server is reachable. Used at startup, where an
    /// unreachable cache is fatal.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Cache ping: {}", pong);
        Ok(())
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn key(identity: &str) -> String {
        format!("{}{}", HISTORY_KEY_PREFIX, identity)
    }

    /// Push a serialized frame to the front of an identity's history list.
    pub async fn push(&self, identity: &str, serialized: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.lpush::<_, _, ()>(Self::key(identity), serialized).await?;
        Ok(())
    }

    /// Fetch up to `limit` entries, newest first.
    pub async fn range(&self, identity: &str, limit: usize) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let entries: Vec<String> = conn
            .lrange(Self::key(identity), 0, limit as isize - 1)
            .await?;
        Ok(entries)
    }

    /// Trim an identity's history list to `len` entries.
    ///
    /// A no-op on lists already at or under the cap.
    pub async fn trim(&self, identity: &str, len: usize) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.ltrim::<_, ()>(Self::key(identity), 0, len as isize - 1)
            .await?;
        Ok(())
    }
}
