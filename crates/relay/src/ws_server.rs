//! WebSocket relay server using Axum.

use crate::auth::TokenVerifier;
use crate::client::{ClientHandle, CLIENT_CHANNEL_BUFFER_SIZE};
use crate::error::{RelayError, Result};
use crate::history::hydrate;
use crate::pipeline::MessagePipeline;
use crate::protocol::{validate_message, ClientFrame};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use common::TokenClaims;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub verifier: TokenVerifier,
    pub pipeline: MessagePipeline,
}

/// Create the relay router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let clients = state.pipeline.registry().client_count();
    format!(r#"{{"status":"ok","clients":{}}}"#, clients)
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Drive one connection from handshake to close.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // The first data frame must carry a valid token.
    let claims = match authenticate(&state, &mut ws_rx).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Handshake failed: {}", e);
            counter!("relay_handshake_failures_total").increment(1);
            return;
        }
    };

    let (tx, mut rx) = mpsc::channel::<Message>(CLIENT_CHANNEL_BUFFER_SIZE);
    let (close_tx, mut close_rx) = mpsc::channel::<()>(1);
    let client = Arc::new(ClientHandle::new(claims.sub, tx, close_tx));

    if let Some(previous) = state.pipeline.registry().register(client.clone()) {
        previous.request_close();
    }

    counter!("relay_connections_total").increment(1);
    gauge!("relay_active_connections").set(state.pipeline.registry().client_count() as f64);

    info!("Client {} connected", client.identity);

    // Spawn task to forward queued frames into the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    match hydrate(
        state.pipeline.cache(),
        state.pipeline.store(),
        state.pipeline.config(),
        &client,
    )
    .await
    {
        Err(e) => {
            warn!("History hydration failed for {}: {}", client.identity, e);
            counter!("relay_hydration_failures_total").increment(1);
        }
        Ok(()) => {
            // Ping interval for keepalive
            let mut ping_interval = interval(Duration::from_secs(30));
            ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    // A newer login for this identity now owns the registry entry
                    _ = close_rx.recv() => {
                        info!("Client {} superseded by a new connection", client.identity);
                        break;
                    }

                    msg = ws_rx.next() => {
                        match msg {
                            Some(Ok(msg)) => {
                                if let Err(e) = handle_message(&state, &client, msg).await {
                                    warn!("Ignoring bad frame from {}: {}", client.identity, e);
                                    counter!("relay_bad_frames_total").increment(1);
                                }
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {:?}", client.identity, e);
                                break;
                            }
                            None => {
                                // Connection closed
                                break;
                            }
                        }
                    }

                    _ = ping_interval.tick() => {
                        if !client.try_send_raw(Message::Ping(vec![].into())) {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cleanup
    state
        .pipeline
        .registry()
        .unregister(&client.identity, client.conn_id);
    send_task.abort();

    counter!("relay_disconnections_total").increment(1);
    gauge!("relay_active_connections").set(state.pipeline.registry().client_count() as f64);

    info!("Client {} disconnected", client.identity);
}

/// Read frames until the client proves who it is.
///
/// Control frames pass through untouched; the first data frame must be a
/// valid auth frame or the handshake fails and the socket is dropped.
async fn authenticate(
    state: &Arc<AppState>,
    ws_rx: &mut SplitStream<WebSocket>,
) -> Result<TokenClaims> {
    loop {
        let msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                return Err(RelayError::Handshake(format!("socket error: {}", e)));
            }
            None => {
                return Err(RelayError::Handshake(
                    "connection closed before auth".to_string(),
                ));
            }
        };

        let frame: ClientFrame = match msg {
            Message::Text(text) => serde_json::from_str(&text)
                .map_err(|e| RelayError::Handshake(format!("malformed first frame: {}", e)))?,
            Message::Binary(data) => serde_json::from_slice(&data)
                .map_err(|e| RelayError::Handshake(format!("malformed first frame: {}", e)))?,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => {
                return Err(RelayError::Handshake(
                    "connection closed before auth".to_string(),
                ));
            }
        };

        return match frame {
            ClientFrame::Auth { token } => state.verifier.verify(&token),
            ClientFrame::Message { .. } => Err(RelayError::Handshake(
                "first frame must be auth".to_string(),
            )),
        };
    }
}

/// Handle a single WebSocket message on an authenticated connection.
async fn handle_message(
    state: &Arc<AppState>,
    client: &Arc<ClientHandle>,
    msg: Message,
) -> Result<()> {
    match msg {
        Message::Text(text) => {
            let frame: ClientFrame = serde_json::from_str(&text)?;
            handle_client_frame(state, client, frame).await
        }
        Message::Binary(data) => {
            let frame: ClientFrame = serde_json::from_slice(&data)?;
            handle_client_frame(state, client, frame).await
        }
        Message::Ping(data) => {
            if client.try_send_raw(Message::Pong(data)) {
                Ok(())
            } else {
                Err(RelayError::ChannelSend)
            }
        }
        Message::Pong(_) => Ok(()),
        Message::Close(_) => {
            // Will be handled by the connection loop
            Ok(())
        }
    }
}

/// Handle a parsed client frame.
async fn handle_client_frame(
    state: &Arc<AppState>,
    client: &Arc<ClientHandle>,
    frame: ClientFrame,
) -> Result<()> {
    match frame {
        ClientFrame::Auth { .. } => Err(RelayError::Protocol(
            "unexpected auth frame on an authenticated connection".to_string(),
        )),
        ClientFrame::Message { receiver, text, .. } => {
            if let Some(reason) = validate_message(&receiver, &text) {
                return Err(RelayError::Protocol(reason));
            }
            state
                .pipeline
                .relay(&client.identity, receiver, text)
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientRegistry;
    use crate::config::RelayConfig;
    use crate::testing::{drain_texts, make_client, InMemoryCache, InMemoryStore, RecordingPublisher};

    fn test_state() -> Arc<AppState> {
        let pipeline = MessagePipeline::new(
            Arc::new(ClientRegistry::new()),
            Arc::new(InMemoryCache::default()),
            Arc::new(InMemoryStore::default()),
            Arc::new(RecordingPublisher::default()),
            RelayConfig::default(),
        );
        Arc::new(AppState {
            verifier: TokenVerifier::new("test-secret"),
            pipeline,
        })
    }

    #[tokio::test]
    async fn test_message_frame_reaches_connected_receiver() {
        let state = test_state();
        let (sender, _sender_rx, _sender_close) = make_client("alice");
        let (receiver, mut receiver_rx, _receiver_close) = make_client("bob");
        state.pipeline.registry().register(receiver);

        let frame = ClientFrame::Message {
            receiver: "bob".to_string(),
            text: "hello".to_string(),
            sent_at: None,
        };
        handle_client_frame(&state, &sender, frame).await.unwrap();

        let texts = drain_texts(&mut receiver_rx);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("hello"));
    }

    #[tokio::test]
    async fn test_second_auth_frame_is_rejected() {
        let state = test_state();
        let (client, _rx, _close) = make_client("alice");

        let frame = ClientFrame::Auth {
            token: "whatever".to_string(),
        };
        let err = handle_client_frame(&state, &client, frame)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let state = test_state();
        let (client, _rx, _close) = make_client("alice");

        let frame = ClientFrame::Message {
            receiver: "bob".to_string(),
            text: String::new(),
            sent_at: None,
        };
        let err = handle_client_frame(&state, &client, frame)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Protocol(_)));
    }
}
