//! Bus client implementation over Redis pub/sub.
//!
//! The relay only publishes; the notifier subscribes. Delivery is
//! fire-and-forget, so a publisher never learns whether anyone listened.

use crate::error::{BusError, Result};
use futures::StreamExt;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seconds allowed for the initial connection check.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Wrapper around the Redis client for publish/subscribe.
#[derive(Clone)]
pub struct BusClient {
    client: Arc<redis::Client>,
}

impl BusClient {
    /// Connect to Redis and verify the server answers a PING.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!("Connecting to Redis bus at {}", redis_url);
        let client = redis::Client::open(redis_url)?;

        let mut conn = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| BusError::ConnectTimeout(CONNECT_TIMEOUT_SECS))??;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Bus ping: {}", pong);

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Publish a payload to a channel (fire-and-forget).
    pub async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.publish::<_, _, ()>(channel, payload).await?;
        debug!("Published {} bytes to '{}'", payload.len(), channel);
        Ok(())
    }

    /// Subscribe to a channel, returning a stream of payloads.
    pub async fn subscribe(&self, channel: &str) -> Result<BusSubscriber> {
        info!("Subscribing to channel '{}'", channel);
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        Ok(BusSubscriber { pubsub })
    }
}

/// A subscription to a single bus channel.
pub struct BusSubscriber {
    pubsub: redis::aio::PubSub,
}

impl BusSubscriber {
    /// Wait for the next payload. `None` means the connection dropped.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            let msg = self.pubsub.on_message().next().await?;
            match msg.get_payload() {
                Ok(payload) => return Some(payload),
                Err(e) => warn!("Dropping undecodable bus payload: {}", e),
            }
        }
    }
}
