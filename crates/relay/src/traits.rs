//! Seams between the session logic and its backing services.
//!
//! Hydration and the pipeline are written against these traits so tests
//! can stand in memory-backed fakes for Postgres and Redis.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storage::StoredMessage;

/// Capped per-identity list of serialized recent frames.
#[async_trait]
pub trait HistoryCache: Send + Sync {
    /// Push a serialized frame to the front of `identity`'s list.
    async fn push(&self, identity: &str, serialized: &str) -> Result<()>;

    /// Up to `limit` entries, newest first.
    async fn range(&self, identity: &str, limit: usize) -> Result<Vec<String>>;

    /// Drop everything past the first `len` entries.
    async fn trim(&self, identity: &str, len: usize) -> Result<()>;
}

/// Durable message record.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a stamped message.
    async fn insert(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Most recent messages where `identity` is a participant, newest first.
    async fn recent_for(&self, identity: &str, limit: usize) -> Result<Vec<StoredMessage>>;
}

/// Fire-and-forget event publication.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a serialized event to `channel`.
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
}

#[async_trait]
impl HistoryCache for crate::cache::MessageCache {
    async fn push(&self, identity: &str, serialized: &str) -> Result<()> {
        crate::cache::MessageCache::push(self, identity, serialized).await
    }

    async fn range(&self, identity: &str, limit: usize) -> Result<Vec<String>> {
        crate::cache::MessageCache::range(self, identity, limit).await
    }

    async fn trim(&self, identity: &str, len: usize) -> Result<()> {
        crate::cache::MessageCache::trim(self, identity, len).await
    }
}

#[async_trait]
impl HistoryStore for storage::MessageStore {
    async fn insert(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        storage::MessageStore::insert(self, sender, receiver, text, sent_at).await?;
        Ok(())
    }

    async fn recent_for(&self, identity: &str, limit: usize) -> Result<Vec<StoredMessage>> {
        let rows = storage::MessageStore::recent_for(self, identity, limit as i64).await?;
        Ok(rows)
    }
}

#[async_trait]
impl EventPublisher for bus::BusClient {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        bus::BusClient::publish(self, channel, payload).await?;
        Ok(())
    }
}
