//! Fan-out pipeline for inbound chat messages.

use crate::client::ClientRegistry;
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::protocol::RelayedMessage;
use crate::traits::{EventPublisher, HistoryCache, HistoryStore};
use axum::extract::ws::Message;
use chrono::Utc;
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Await `fut` for at most `deadline`, mapping expiry to a relay error.
pub(crate) async fn bounded<T, F>(deadline: Duration, what: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RelayError::Timeout(what)),
    }
}

/// Carries each inbound message through stamping, persistence, cache
/// update, event publication and local delivery.
///
/// Backend failures are logged and counted but never stop the remaining
/// steps; the sender gets no feedback either way.
pub struct MessagePipeline {
    registry: Arc<ClientRegistry>,
    cache: Arc<dyn HistoryCache>,
    store: Arc<dyn HistoryStore>,
    publisher: Arc<dyn EventPublisher>,
    config: RelayConfig,
}

impl MessagePipeline {
    pub fn new(
        registry: Arc<ClientRegistry>,
        cache: Arc<dyn HistoryCache>,
        store: Arc<dyn HistoryStore>,
        publisher: Arc<dyn EventPublisher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            store,
            publisher,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn cache(&self) -> &dyn HistoryCache {
        self.cache.as_ref()
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    /// Stamp and fan out one message from `sender`.
    pub async fn relay(&self, sender: &str, receiver: String, text: String) -> Result<RelayedMessage> {
        let message = RelayedMessage {
            sender: sender.to_string(),
            receiver,
            text,
            sent_at: Utc::now(),
        };

        if let Err(e) = bounded(
            self.config.call_timeout,
            "message insert",
            self.store.insert(
                &message.sender,
                &message.receiver,
                &message.text,
                message.sent_at,
            ),
        )
        .await
        {
            warn!("Failed to persist message for {}: {}", message.receiver, e);
            counter!("relay_pipeline_errors_total", "step" => "persist").increment(1);
        }

        let frame = serde_json::to_string(&message.to_frame())?;

        if let Err(e) = self.cache_frame(&message.receiver, &frame).await {
            warn!("Failed to cache message for {}: {}", message.receiver, e);
            counter!("relay_pipeline_errors_total", "step" => "cache").increment(1);
        }

        if let Err(e) = self.publish_event(&message).await {
            warn!("Failed to publish event for {}: {}", message.receiver, e);
            counter!("relay_pipeline_errors_total", "step" => "publish").increment(1);
        }

        match self.registry.get(&message.receiver) {
            Some(client) => {
                if client.try_send_raw(Message::Text(frame.into())) {
                    debug!("Delivered message from {} to {}", message.sender, message.receiver);
                    counter!("relay_messages_delivered_total").increment(1);
                } else {
                    warn!("Dropped message for {}: send buffer full", message.receiver);
                    counter!("relay_pipeline_errors_total", "step" => "deliver").increment(1);
                }
            }
            None => {
                info!("User {} is offline", message.receiver);
            }
        }

        counter!("relay_messages_total").increment(1);
        Ok(message)
    }

    async fn cache_frame(&self, receiver: &str, frame: &str) -> Result<()> {
        bounded(
            self.config.call_timeout,
            "cache push",
            self.cache.push(receiver, frame),
        )
        .await?;
        bounded(
            self.config.call_timeout,
            "cache trim",
            self.cache.trim(receiver, crate::config::HISTORY_LIMIT),
        )
        .await
    }

    async fn publish_event(&self, message: &RelayedMessage) -> Result<()> {
        let payload = serde_json::to_string(&message.to_event())?;
        bounded(
            self.config.call_timeout,
            "event publish",
            self.publisher.publish(&self.config.bus_channel, &payload),
        )
        .await
    }
}
