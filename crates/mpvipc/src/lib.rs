//! mpvipc: async client for mpv's JSON IPC protocol
//!
//! mpv exposes a line-delimited JSON protocol on a Unix socket (or a named
//! pipe on Windows) when started with `--input-ipc-server`. This crate opens
//! that socket, correlates command replies with their requests by
//! `request_id`, and broadcasts the events mpv pushes to registered listeners.
//!
//! # Examples
//!
//! ## Commands and properties
//!
//! ```ignore
//! use mpvipc::{ConnectOptions, Connection};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::new(ConnectOptions::from_env());
//!     connection.open().await?;
//!
//!     // Toggle play/pause
//!     connection.call(&[json!("cycle"), json!("pause")]).await?;
//!
//!     // Decrease volume by 3, showing an OSD bar
//!     connection
//!         .call(&[json!("osd-msg-bar"), json!("add"), json!("volume"), json!(-3)])
//!         .await?;
//!
//!     let paused: bool = connection.get_as("pause").await?;
//!     println!("paused: {}", paused);
//!
//!     connection.set("percent-pos", 50).await?;
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Events
//!
//! ```ignore
//! use mpvipc::{ConnectOptions, Connection, EventKind};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::new(ConnectOptions::from_env());
//!     connection.open().await?;
//!
//!     let (subscription, mut events) = connection.subscribe();
//!     connection
//!         .call(&[json!("observe_property"), json!(42), json!("volume")])
//!         .await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let EventKind::PropertyChange { id: 42, data } = event.kind() {
//!             println!("volume is now {}", data);
//!         }
//!     }
//!
//!     subscription.cancel();
//!     Ok(())
//! }
//! ```
//!
//! Listeners and completion callbacks run on the connection's reader task.
//! They must not block; hand work off to another task instead.

// Internal modules (exposed for integration tests)
#[doc(hidden)]
pub mod server;

pub mod api;
mod error;
pub mod protocol;

// Re-export error types
pub use error::{Error, Result};

// Re-export the connection API
pub use server::connection::{Completion, Connection, ListenerId, Subscription};

// Re-export transport seams for custom streams
pub use server::transport::{BoxedReader, BoxedWriter, Dialer, IpcSocketDialer};

// Re-export protocol types
pub use protocol::{
    ChannelListener, CommandResult, EndFileReason, Event, EventFilter, EventKind, EventListener,
    FilteredListener,
};

// Re-export options
pub use api::ConnectOptions;
