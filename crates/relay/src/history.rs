//! History hydration for freshly authenticated connections.

use crate::client::ClientHandle;
use crate::config::{RelayConfig, HISTORY_LIMIT};
use crate::error::{RelayError, Result};
use crate::pipeline::bounded;
use crate::protocol::ServerFrame;
use crate::traits::{HistoryCache, HistoryStore};
use axum::extract::ws::Message;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Replay the client's recent history, newest first.
///
/// The cache is tried first; on a hit the cached frames are replayed
/// verbatim. Otherwise the store is queried and the cache warmed so the
/// next connection hits it. A failing cache only forces the store path,
/// but a failing store query ends the hydration.
pub async fn hydrate(
    cache: &dyn HistoryCache,
    store: &dyn HistoryStore,
    config: &RelayConfig,
    client: &Arc<ClientHandle>,
) -> Result<()> {
    let identity = client.identity.as_str();

    let cached = match bounded(
        config.call_timeout,
        "history cache read",
        cache.range(identity, HISTORY_LIMIT),
    )
    .await
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!("History cache read failed for {}: {}", identity, e);
            Vec::new()
        }
    };

    if !cached.is_empty() {
        debug!("Hydrating {} from cache ({} frames)", identity, cached.len());
        for serialized in &cached {
            if !client.try_send_raw(Message::Text(serialized.clone().into())) {
                return Err(RelayError::ChannelSend);
            }
        }
        counter!("relay_hydrations_total", "source" => "cache").increment(1);
        return Ok(());
    }

    let records = bounded(
        config.call_timeout,
        "history query",
        store.recent_for(identity, HISTORY_LIMIT),
    )
    .await?;

    if records.is_empty() {
        debug!("No history for {}", identity);
        return Ok(());
    }

    let mut serialized = Vec::with_capacity(records.len());
    for record in &records {
        let frame = ServerFrame::Message {
            receiver: record.receiver.clone(),
            text: record.text.clone(),
            sent_at: record.sent_at,
        };
        serialized.push(serde_json::to_string(&frame)?);
    }

    debug!(
        "Hydrating {} from store ({} frames)",
        identity,
        serialized.len()
    );
    for frame in &serialized {
        if !client.try_send_raw(Message::Text(frame.clone().into())) {
            return Err(RelayError::ChannelSend);
        }
    }

    // Warm the cache oldest first so the list head stays the newest frame.
    for frame in serialized.iter().rev() {
        if let Err(e) = bounded(
            config.call_timeout,
            "history cache warm",
            cache.push(identity, frame),
        )
        .await
        {
            warn!("History cache warm failed for {}: {}", identity, e);
        }
    }
    if let Err(e) = bounded(
        config.call_timeout,
        "history cache trim",
        cache.trim(identity, HISTORY_LIMIT),
    )
    .await
    {
        warn!("History cache trim failed for {}: {}", identity, e);
    }

    counter!("relay_hydrations_total", "source" => "store").increment(1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain_texts, make_client, InMemoryCache, InMemoryStore};
    use std::sync::atomic::Ordering;

    fn config() -> RelayConfig {
        RelayConfig::default()
    }

    #[tokio::test]
    async fn test_hydrate_from_cache_skips_store() {
        let cache = InMemoryCache::default();
        let store = InMemoryStore::default();
        cache.preload(
            "alice",
            vec![
                r#"{"kind":"message","receiver":"alice","text":"newest","sent_at":"2024-05-01T12:01:00Z"}"#.to_string(),
                r#"{"kind":"message","receiver":"alice","text":"older","sent_at":"2024-05-01T12:00:00Z"}"#.to_string(),
            ],
        );
        let (client, mut rx, _close) = make_client("alice");

        hydrate(&cache, &store, &config(), &client).await.unwrap();

        let texts = drain_texts(&mut rx);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("newest"));
        assert!(texts[1].contains("older"));
        assert_eq!(store.recent_calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_hydrate_falls_back_to_store_and_warms_cache() {
        let cache = InMemoryCache::default();
        let store = InMemoryStore::default();
        store.preload(
            "bob",
            "alice",
            "first",
            "2024-05-01T12:00:00Z".parse().unwrap(),
        );
        store.preload(
            "alice",
            "bob",
            "second",
            "2024-05-01T12:01:00Z".parse().unwrap(),
        );
        let (client, mut rx, _close) = make_client("alice");

        hydrate(&cache, &store, &config(), &client).await.unwrap();

        // Newest first on the wire.
        let texts = drain_texts(&mut rx);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("second"));
        assert!(texts[1].contains("first"));

        // Cache head is the newest frame and no frame leaks a sender.
        let warmed = cache.list("alice");
        assert_eq!(warmed.len(), 2);
        assert!(warmed[0].contains("second"));
        for entry in &warmed {
            let value: serde_json::Value = serde_json::from_str(entry).unwrap();
            assert!(value.get("sender").is_none());
        }
    }

    #[tokio::test]
    async fn test_hydrate_cache_error_falls_back_to_store() {
        let cache = InMemoryCache::default();
        cache.fail_reads.store(true, Ordering::Relaxed);
        let store = InMemoryStore::default();
        store.preload(
            "bob",
            "alice",
            "hello",
            "2024-05-01T12:00:00Z".parse().unwrap(),
        );
        let (client, mut rx, _close) = make_client("alice");

        hydrate(&cache, &store, &config(), &client).await.unwrap();

        let texts = drain_texts(&mut rx);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("hello"));
        assert_eq!(store.recent_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_hydrate_empty_everywhere_sends_nothing() {
        let cache = InMemoryCache::default();
        let store = InMemoryStore::default();
        let (client, mut rx, _close) = make_client("alice");

        hydrate(&cache, &store, &config(), &client).await.unwrap();

        assert!(drain_texts(&mut rx).is_empty());
        assert!(cache.list("alice").is_empty());
    }
}
