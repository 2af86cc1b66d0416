//! Integration tests over a real Unix domain socket
//!
//! A small mpv stand-in listens on a temporary socket and answers every
//! `get_property` request with the property name, which exercises the
//! platform dialer together with the full connection stack.

#![cfg(unix)]

use mpvipc::{ConnectOptions, Connection, Error};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

mod common;

/// Accept one client and echo property names back until it disconnects
fn spawn_echo_mpv(path: &Path) -> tokio::task::JoinHandle<usize> {
    let listener = UnixListener::bind(path).expect("Failed to bind socket");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let mut handled = 0;

        writer.write_all(b"{\"event\":\"idle\"}\n").await.unwrap();

        while let Ok(Some(line)) = lines.next_line().await {
            let request: Value = serde_json::from_str(&line).unwrap();
            let reply = json!({
                "error": "success",
                "data": request["command"][1],
                "request_id": request["request_id"],
            });
            if writer
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .is_err()
            {
                break;
            }
            handled += 1;
        }

        handled
    })
}

#[tokio::test]
async fn test_connection_over_unix_socket() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpv.sock");
    let server = spawn_echo_mpv(&path);

    let connection = Connection::new(ConnectOptions::new().socket_path(&path));
    let (_subscription, mut events) = connection.subscribe();
    connection.open().await.unwrap();

    assert_eq!(events.recv().await.unwrap().name, "idle");

    let value = connection.get("volume").await.unwrap();
    assert_eq!(value, json!("volume"));

    connection.close().await.unwrap();
    assert!(connection.is_closed());

    assert_eq!(server.await.unwrap(), 1);
}

#[tokio::test]
async fn test_many_concurrent_calls_over_socket() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpv.sock");
    let server = spawn_echo_mpv(&path);

    let connection = Arc::new(Connection::new(ConnectOptions::new().socket_path(&path)));
    connection.open().await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..200 {
        let connection = Arc::clone(&connection);
        tasks.push(tokio::spawn(async move {
            let property = format!("prop-{}", i);
            let value = connection.get(&property).await.unwrap();
            assert_eq!(value, json!(property));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    connection.close().await.unwrap();
    assert_eq!(server.await.unwrap(), 200);
}

#[tokio::test]
async fn test_open_without_mpv() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let connection =
        Connection::new(ConnectOptions::new().socket_path(dir.path().join("nobody-home.sock")));

    assert!(matches!(
        connection.open().await,
        Err(Error::ConnectionFailed(_))
    ));
    assert!(connection.is_closed());
}
