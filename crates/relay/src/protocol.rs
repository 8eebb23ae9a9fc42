//! WebSocket protocol frame types.
//!
//! Defines the JSON frame format for client-server communication. Frames
//! are tagged on `kind`; anything with an unknown kind fails decoding.

use crate::config::MAX_TEXT_BYTES;
use chrono::{DateTime, Utc};
use common::MessageEvent;
use serde::{Deserialize, Serialize};

// ============================================================================
// Client → Server Frames
// ============================================================================

/// Frame sent from client to server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Handshake frame; must be the first frame on every connection.
    Auth {
        /// Bearer token issued by the user service.
        token: String,
    },
    /// A chat message for another user.
    Message {
        /// Identity of the intended recipient.
        receiver: String,
        /// Message body.
        text: String,
        /// Ignored; the server stamps its own receipt time.
        #[serde(default)]
        sent_at: Option<DateTime<Utc>>,
    },
}

// ============================================================================
// Server → Client Frames
// ============================================================================

/// Frame sent from server to client.
///
/// No variant carries a sender. Frames are cached verbatim for history
/// replay; live delivery and replay put the same bytes on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A delivered or replayed chat message.
    Message {
        receiver: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
}

/// A message after server stamping, before fan-out.
///
/// Internal form only: `to_frame` drops the sender for the client wire,
/// `to_event` keeps it for the bus.
#[derive(Debug, Clone)]
pub struct RelayedMessage {
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl RelayedMessage {
    /// The client-facing representation of this message.
    pub fn to_frame(&self) -> ServerFrame {
        ServerFrame::Message {
            receiver: self.receiver.clone(),
            text: self.text.clone(),
            sent_at: self.sent_at,
        }
    }

    /// The bus representation of this message.
    pub fn to_event(&self) -> MessageEvent {
        MessageEvent {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            text: self.text.clone(),
            sent_at: self.sent_at,
        }
    }
}

/// Validate a message frame's fields.
///
/// Returns a description of the violation, or `None` when the frame is
/// acceptable.
pub fn validate_message(receiver: &str, text: &str) -> Option<String> {
    if receiver.is_empty() {
        return Some("receiver must not be empty".to_string());
    }
    if text.is_empty() {
        return Some("text must not be empty".to_string());
    }
    if text.len() > MAX_TEXT_BYTES {
        return Some(format!(
            "text exceeds {} bytes ({})",
            MAX_TEXT_BYTES,
            text.len()
        ));
    }
    None
}
