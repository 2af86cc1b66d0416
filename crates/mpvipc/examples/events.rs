// Example: Listening for events
//
// Observes the volume property and prints every event for ten seconds.
//
// Usage: MPV_SOCKET=/tmp/mpvsocket cargo run --example events

use mpvipc::{ConnectOptions, Connection, EventKind};
use serde_json::json;
use std::time::Duration;

const VOLUME_OBSERVER: u64 = 42;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let connection = Connection::new(ConnectOptions::from_env());
    connection.open().await?;

    let (subscription, mut events) = connection.subscribe();
    connection
        .call(&[
            json!("observe_property"),
            json!(VOLUME_OBSERVER),
            json!("volume"),
        ])
        .await?;

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event.kind() {
                EventKind::PropertyChange { id: VOLUME_OBSERVER, data } => {
                    println!("volume is now {}", data)
                }
                EventKind::EndFile { reason, error } => {
                    println!("playback ended: {:?} {}", reason, error.unwrap_or_default())
                }
                _ => println!("received event: {}", event.name),
            },
            _ = &mut deadline => break,
        }
    }

    subscription.cancel();
    connection.close().await?;
    Ok(())
}
