//! Tests for newline framing in the transport layer
//!
//! These tests verify that the receiver reassembles lines that arrive in
//! pieces and handles very large lines, as happens with big property values
//! such as `playlist` or `track-list`.

use mpvipc::server::transport::LineTransportReceiver;
use serde_json::json;
use tokio::io::AsyncWriteExt;

mod common;

/// Test that a line written in several small pieces arrives whole
#[tokio::test]
async fn test_line_split_across_writes() {
    common::init_tracing();
    let (reader, mut mpv) = tokio::io::duplex(1024);
    let (mut receiver, mut rx) = LineTransportReceiver::new(reader);
    let read_task = tokio::spawn(async move { receiver.run_loop().await });

    for piece in [r#"{"error":"succ"#, r#"ess","data":tr"#, "ue,\"request_id\":3}", "\n"] {
        mpv.write_all(piece.as_bytes()).await.unwrap();
        mpv.flush().await.unwrap();
        tokio::task::yield_now().await;
    }

    let line = rx.recv().await.unwrap();
    assert_eq!(line, r#"{"error":"success","data":true,"request_id":3}"#);

    drop(mpv);
    assert!(read_task.await.unwrap().is_ok());
}

/// Test that a line far larger than the duplex buffer is delivered intact
#[tokio::test]
async fn test_large_line() {
    common::init_tracing();
    let (reader, mut mpv) = tokio::io::duplex(64 * 1024);
    let (mut receiver, mut rx) = LineTransportReceiver::new(reader);
    let read_task = tokio::spawn(async move { receiver.run_loop().await });

    let playlist: Vec<_> = (0..20_000)
        .map(|i| json!({"filename": format!("/music/track-{:05}.flac", i)}))
        .collect();
    let message = json!({"error": "success", "data": playlist, "request_id": 1});
    let mut line = serde_json::to_vec(&message).unwrap();
    assert!(line.len() > 512 * 1024, "Test line should be > 512KB");
    line.push(b'\n');

    let write_task = tokio::spawn(async move {
        mpv.write_all(&line).await.unwrap();
        mpv.flush().await.unwrap();
        mpv
    });

    let received = rx.recv().await.unwrap();
    let decoded: serde_json::Value = serde_json::from_str(&received).unwrap();
    assert_eq!(decoded, message);

    drop(write_task.await.unwrap());
    assert!(read_task.await.unwrap().is_ok());
}

/// Test that many back-to-back lines keep their order
#[tokio::test]
async fn test_many_lines_in_order() {
    common::init_tracing();
    let (reader, mut mpv) = tokio::io::duplex(4096);
    let (mut receiver, mut rx) = LineTransportReceiver::new(reader);
    let read_task = tokio::spawn(async move { receiver.run_loop().await });

    let write_task = tokio::spawn(async move {
        for i in 0..1000 {
            let line = format!("{}\n", json!({"event": "property-change", "id": i}));
            mpv.write_all(line.as_bytes()).await.unwrap();
        }
        mpv.flush().await.unwrap();
    });

    for i in 0..1000 {
        let line = rx.recv().await.unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded["id"], json!(i));
    }

    write_task.await.unwrap();
    assert!(read_task.await.unwrap().is_ok());
    assert!(rx.recv().await.is_none());
}
