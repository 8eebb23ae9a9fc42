//! Bus events published for every relayed message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default pub/sub channel for new-message events.
pub const DEFAULT_BUS_CHANNEL: &str = "new_message";

/// Event published on the broadcast bus after a message is persisted.
///
/// Internal payload for downstream consumers such as the notifier. Unlike
/// client-facing frames, it carries the sender; the notifier cannot name
/// who wrote the message without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}
