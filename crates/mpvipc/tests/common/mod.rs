//! Shared helpers for integration tests
//!
//! `FakeMpv` plays the mpv side of an in-memory duplex stream: it reads the
//! requests a `Connection` writes and answers with scripted lines.

#![allow(dead_code)]

use mpvipc::{BoxedReader, BoxedWriter, ConnectOptions, Connection, Dialer, Error, Result};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, Once};
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

static TRACING: Once = Once::new();

/// Install a tracing subscriber once per test binary (respects RUST_LOG)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Dialer handing out in-memory streams, one per `open()`
pub struct DuplexDialer {
    streams: Mutex<VecDeque<DuplexStream>>,
}

impl DuplexDialer {
    pub fn new(streams: Vec<DuplexStream>) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
        }
    }
}

impl Dialer for DuplexDialer {
    fn dial(&self) -> Pin<Box<dyn Future<Output = Result<(BoxedReader, BoxedWriter)>> + Send + '_>> {
        let next = self.streams.lock().unwrap().pop_front();
        Box::pin(async move {
            let stream =
                next.ok_or_else(|| Error::ConnectionFailed("mpv is not running".to_string()))?;
            let (reader, writer) = tokio::io::split(stream);
            Ok((Box::new(reader) as BoxedReader, Box::new(writer) as BoxedWriter))
        })
    }
}

/// The mpv end of a duplex stream
pub struct FakeMpv {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeMpv {
    pub fn new(stream: DuplexStream) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Read the next request line the client wrote
    pub async fn next_request(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a request")
            .expect("failed to read request")
            .expect("client closed the stream");
        serde_json::from_str(&line).expect("request is not valid JSON")
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    pub async fn reply(&mut self, request_id: u64, status: &str, data: Value) {
        let line = json!({"error": status, "data": data, "request_id": request_id});
        self.send_line(&line.to_string()).await;
    }

    /// Answer the next request with `"success"` and the given data
    pub async fn answer_next(&mut self, data: Value) -> Value {
        let request = self.next_request().await;
        let request_id = request["request_id"].as_u64().expect("request_id missing");
        self.reply(request_id, "success", data).await;
        request
    }

    pub async fn event(&mut self, event: Value) {
        self.send_line(&event.to_string()).await;
    }

    /// Close both directions, as if mpv quit
    pub fn hang_up(self) {
        drop(self);
    }
}

/// A closed connection plus the fake mpv it will talk to once opened
pub fn connection_pair() -> (Connection, FakeMpv) {
    connection_pair_with(ConnectOptions::default())
}

pub fn connection_pair_with(options: ConnectOptions) -> (Connection, FakeMpv) {
    let (client, mpv) = tokio::io::duplex(64 * 1024);
    let connection = Connection::with_dialer(DuplexDialer::new(vec![client]), options);
    (connection, FakeMpv::new(mpv))
}

/// Poll until `condition` holds, panicking after two seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
