//! Message persistence.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::debug;

/// A persisted chat message.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Store for chat messages.
#[derive(Clone)]
pub struct MessageStore {
    pool: PgPool,
}

impl MessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a stamped message, returning the assigned row id.
    pub async fn insert(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO messages (sender, receiver, text, sent_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(sender)
        .bind(receiver)
        .bind(text)
        .bind(sent_at)
        .fetch_one(&self.pool)
        .await?;

        debug!("Persisted message {} from {} to {}", id, sender, receiver);
        Ok(id)
    }

    /// The most recent messages where `identity` is sender or receiver,
    /// newest first, bounded by `limit`.
    pub async fn recent_for(&self, identity: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, StoredMessage>(
            "SELECT id, sender, receiver, text, sent_at FROM messages \
             WHERE sender = $1 OR receiver = $1 \
             ORDER BY sent_at DESC LIMIT $2",
        )
        .bind(identity)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
