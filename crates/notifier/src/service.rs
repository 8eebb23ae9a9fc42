//! Bus subscription service that emails receivers about new messages.

use crate::email::EmailClient;
use anyhow::Result;
use bus::BusClient;
use common::MessageEvent;
use metrics::{counter, gauge};
use std::time::Duration;
use storage::UserStore;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Configuration for the notifier service.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Pub/sub channel to subscribe to.
    pub channel: String,
    /// Metrics update interval in seconds.
    pub metrics_interval_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: common::DEFAULT_BUS_CHANNEL.to_string(),
            metrics_interval_secs: 5,
        }
    }
}

/// Service that subscribes to new-message events and notifies receivers
/// by email.
pub struct NotifierService {
    bus: BusClient,
    users: UserStore,
    email: EmailClient,
    config: NotifierConfig,
    shutdown_rx: mpsc::Receiver<()>,
    handled: u64,
}

impl NotifierService {
    pub fn new(
        bus: BusClient,
        users: UserStore,
        email: EmailClient,
        config: NotifierConfig,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            bus,
            users,
            email,
            config,
            shutdown_rx,
            handled: 0,
        }
    }

    /// Run the service (blocking).
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Starting NotifierService, subscribing to '{}'",
            self.config.channel
        );

        let mut subscriber = self.bus.subscribe(&self.config.channel).await?;

        info!("NotifierService running");

        // Metrics update ticker
        let mut metrics_interval =
            tokio::time::interval(Duration::from_secs(self.config.metrics_interval_secs));

        loop {
            tokio::select! {
                biased;  // Prioritize shutdown signal

                _ = self.shutdown_rx.recv() => {
                    info!("NotifierService received shutdown signal");
                    break;
                }

                _ = metrics_interval.tick() => {
                    gauge!("notifier_events_handled").set(self.handled as f64);
                }

                payload = subscriber.next() => {
                    match payload {
                        Some(payload) => {
                            counter!("notifier_events_received_total").increment(1);

                            if let Err(e) = self.handle_event(&payload).await {
                                error!("Failed to handle event: {:?}", e);
                                counter!(
                                    "notifier_errors_total",
                                    "error_type" => "processing"
                                ).increment(1);
                            } else {
                                self.handled += 1;
                            }
                        }
                        None => {
                            warn!("Subscription ended unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        info!("NotifierService stopped");
        Ok(())
    }

    /// Handle a single new-message event.
    async fn handle_event(&self, payload: &str) -> Result<()> {
        let event: MessageEvent = serde_json::from_str(payload)?;

        debug!("New message event for {}", event.receiver);

        let user = match self.users.find_by_id(&event.receiver).await? {
            Some(user) => user,
            None => {
                warn!(
                    "No account for receiver {}, skipping notification",
                    event.receiver
                );
                counter!("notifier_unknown_receivers_total").increment(1);
                return Ok(());
            }
        };

        let (subject, body) = render_notification(&event);
        self.email.send(&user.email, &subject, &body).await?;

        counter!("notifier_emails_sent_total").increment(1);
        debug!(
            "Notified {} about a message from {}",
            event.receiver, event.sender
        );
        Ok(())
    }
}

/// Subject and body for a new-message notification.
fn render_notification(event: &MessageEvent) -> (String, String) {
    let subject = format!("New message from {}", event.sender);
    let body = format!(
        "From: {}\nAt: {}\n\n{}",
        event.sender,
        event.sent_at.to_rfc3339(),
        event.text
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_render_notification_names_sender() {
        let event = MessageEvent {
            sender: "alice".to_string(),
            receiver: "bob".to_string(),
            text: "lunch?".to_string(),
            sent_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        };

        let (subject, body) = render_notification(&event);
        assert_eq!(subject, "New message from alice");
        assert!(body.contains("lunch?"));
        assert!(body.contains("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_event_decodes_from_relay_payload() {
        let payload = format!(
            r#"{{"sender":"alice","receiver":"bob","text":"hi","sent_at":"{}"}}"#,
            Utc::now().to_rfc3339()
        );

        let event: MessageEvent = serde_json::from_str(&payload).unwrap();
        assert_eq!(event.sender, "alice");
        assert_eq!(event.receiver, "bob");
        assert_eq!(event.text, "hi");
    }
}
