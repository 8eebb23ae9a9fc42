//! In-memory fakes for the cache, store and bus seams.

use crate::client::{ClientHandle, CLIENT_CHANNEL_BUFFER_SIZE};
use crate::error::{RelayError, Result};
use crate::traits::{EventPublisher, HistoryCache, HistoryStore};
use async_trait::async_trait;
use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storage::StoredMessage;
use tokio::sync::mpsc;

/// Memory-backed stand-in for the Redis history cache.
#[derive(Default)]
pub struct InMemoryCache {
    pub lists: Mutex<HashMap<String, Vec<String>>>,
    pub fail_reads: AtomicBool,
}

impl InMemoryCache {
    pub fn list(&self, identity: &str) -> Vec<String> {
        self.lists
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn preload(&self, identity: &str, entries: Vec<String>) {
        self.lists
            .lock()
            .unwrap()
            .insert(identity.to_string(), entries);
    }
}

#[async_trait]
impl HistoryCache for InMemoryCache {
    async fn push(&self, identity: &str, serialized: &str) -> Result<()> {
        self.lists
            .lock()
            .unwrap()
            .entry(identity.to_string())
            .or_default()
            .insert(0, serialized.to_string());
        Ok(())
    }

    async fn range(&self, identity: &str, limit: usize) -> Result<Vec<String>> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(RelayError::Internal("cache down".to_string()));
        }
        let mut entries = self.list(identity);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn trim(&self, identity: &str, len: usize) -> Result<()> {
        if let Some(list) = self.lists.lock().unwrap().get_mut(identity) {
            list.truncate(len);
        }
        Ok(())
    }
}

/// Memory-backed stand-in for the Postgres message store.
#[derive(Default)]
pub struct InMemoryStore {
    pub records: Mutex<Vec<StoredMessage>>,
    pub next_id: AtomicI64,
    pub fail_inserts: AtomicBool,
    pub recent_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn preload(&self, sender: &str, receiver: &str, text: &str, sent_at: DateTime<Utc>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.records.lock().unwrap().push(StoredMessage {
            id,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            text: text.to_string(),
            sent_at,
        });
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn insert(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail_inserts.load(Ordering::Relaxed) {
            return Err(RelayError::Internal("store down".to_string()));
        }
        self.preload(sender, receiver, text, sent_at);
        Ok(())
    }

    async fn recent_for(&self, identity: &str, limit: usize) -> Result<Vec<StoredMessage>> {
        self.recent_calls.fetch_add(1, Ordering::Relaxed);
        let mut matching: Vec<StoredMessage> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.sender == identity || r.receiver == identity)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

/// Publisher that records every payload instead of sending it anywhere.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(RelayError::Internal("bus down".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}

/// Build a client handle plus the receivers its session would own.
pub fn make_client(
    identity: &str,
) -> (Arc<ClientHandle>, mpsc::Receiver<Message>, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(CLIENT_CHANNEL_BUFFER_SIZE);
    let (close_tx, close_rx) = mpsc::channel(1);
    (Arc::new(ClientHandle::new(identity, tx, close_tx)), rx, close_rx)
}

/// Drain every text frame currently queued for a client.
pub fn drain_texts(rx: &mut mpsc::Receiver<Message>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Message::Text(text) = msg {
            texts.push(text.to_string());
        }
    }
    texts
}
