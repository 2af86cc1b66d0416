// Example: Commands and properties
//
// Start mpv with an IPC socket first:
//   mpv --idle --input-ipc-server=/tmp/mpvsocket
//
// Usage: MPV_SOCKET=/tmp/mpvsocket cargo run --example basic

use mpvipc::{ConnectOptions, Connection};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = ConnectOptions::from_env().call_timeout(Duration::from_secs(5));
    println!("Connecting to {}...", options.socket_path.display());

    let connection = Connection::new(options);
    connection.open().await?;

    let version = connection.call(&[json!("get_version")]).await?;
    println!("mpv client API version: {}", version);

    // Toggle play/pause
    connection.call(&[json!("cycle"), json!("pause")]).await?;
    let paused: bool = connection.get_as("pause").await?;
    println!("paused: {}", paused);

    // Increase volume by 5, then decrease by 3 showing an OSD bar
    connection
        .call(&[json!("add"), json!("volume"), json!(5)])
        .await?;
    connection
        .call(&[json!("osd-msg-bar"), json!("add"), json!("volume"), json!(-3)])
        .await?;
    println!("volume: {}", connection.get("volume").await?);

    match connection.get("time-pos").await {
        Ok(position) => println!("seconds from start: {}", position),
        Err(e) => println!("no position ({})", e),
    }

    connection.close().await?;
    Ok(())
}
