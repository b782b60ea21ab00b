//! Chat client - example of channels and broadcasts.
//!
//! This example demonstrates:
//! - Connecting with an auth payload
//! - Listening for local and application events
//! - Joining a channel and broadcasting into it
//!
//! # Running against an EvSocket server
//!
//! ```sh
//! cargo run --example chat ws://localhost:8080
//! ```

use std::time::Duration;

use evsock_client::{callback, ConnectOptions, EvSocket};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let uri = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:8080".to_string());

    let socket = EvSocket::connect(
        &uri,
        ConnectOptions::new().auth(json!({"token": "demo"})),
    )
    .await?;

    socket.on(
        "open",
        callback(|_| {
            println!("connected, joining #lobby");
        }),
    );

    socket.on(
        "channeljoin",
        callback(|payload| {
            println!("joined channel: {:?}", payload.as_json());
        }),
    );

    socket.on(
        "chat",
        callback(|payload| {
            println!("chat: {:?}", payload.as_json());
        }),
    );

    socket.on(
        "error",
        callback(|payload| {
            eprintln!("error: {:?}", payload.as_json());
        }),
    );

    socket.join("lobby")?;

    // Give the join round-trip a moment, then say hello to the room
    tokio::time::sleep(Duration::from_millis(500)).await;
    socket.broadcast("chat", &json!({"msg": "hello from rust"}))?;
    socket.send_binary("chunk", &[1, 2, 3])?;

    tokio::time::sleep(Duration::from_secs(5)).await;
    socket.close()?;
    Ok(())
}
