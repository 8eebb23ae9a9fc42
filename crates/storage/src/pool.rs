//! Connection pool bootstrap and schema setup.

use crate::error::{Result, StorageError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Seconds allowed for the initial database connection.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS messages (
    id       BIGSERIAL PRIMARY KEY,
    sender   TEXT NOT NULL,
    receiver TEXT NOT NULL,
    text     TEXT NOT NULL,
    sent_at  TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_sender_sent_at ON messages (sender, sent_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_receiver_sent_at ON messages (receiver, sent_at DESC);
"#;

/// Connect to Postgres eagerly so startup fails fast when the database
/// is unreachable.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = tokio::time::timeout(
        Duration::from_secs(CONNECT_TIMEOUT_SECS),
        PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url),
    )
    .await
    .map_err(|_| StorageError::ConnectTimeout(CONNECT_TIMEOUT_SECS))??;

    info!("Connected to Postgres");
    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
///
/// Idempotent; every service that owns writes runs this at startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("Database schema ready");
    Ok(())
}
