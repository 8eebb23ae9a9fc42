//! Interactive chat client for manual testing.
//!
//! Usage:
//!   cargo run -p relay --example chat_client -- \
//!       --token <jwt> --to <identity> [--url ws://localhost:8080/chat]
//!
//! Type a line and press enter to send it; incoming frames print as they
//! arrive.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() {
    let mut url = "ws://localhost:8080/chat".to_string();
    let mut token = String::new();
    let mut to = String::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => url = args.next().expect("--url needs a value"),
            "--token" => token = args.next().expect("--token needs a value"),
            "--to" => to = args.next().expect("--to needs a value"),
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }
    if token.is_empty() || to.is_empty() {
        eprintln!("Usage: chat_client --token <jwt> --to <identity> [--url <ws url>]");
        std::process::exit(1);
    }

    println!("Connecting to {}...", url);
    let connect = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        connect_async(url.as_str()),
    );
    let (ws, _response) = match connect.await {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            eprintln!("Connection failed: {:?}", e);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Connection timed out");
            std::process::exit(1);
        }
    };
    println!("Connected");

    let (mut ws_tx, mut ws_rx) = ws.split();

    // The relay expects an auth frame before anything else
    let auth = serde_json::json!({ "kind": "auth", "token": token });
    ws_tx
        .send(Message::text(auth.to_string()))
        .await
        .expect("auth send failed");

    // Print incoming frames
    let read_task = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => println!("<< {}", text),
                Ok(Message::Close(_)) => {
                    println!("Server closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Read error: {:?}", e);
                    break;
                }
            }
        }
    });

    // Read stdin lines and send them as message frames
    println!("Chatting with {}; type a message and press enter", to);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            continue;
        }
        let frame = serde_json::json!({ "kind": "message", "receiver": to, "text": line });
        if ws_tx.send(Message::text(frame.to_string())).await.is_err() {
            eprintln!("Send failed, closing");
            break;
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
    read_task.abort();
}
