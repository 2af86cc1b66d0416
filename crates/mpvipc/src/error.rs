// Error types for mpvipc

use thiserror::Error;

/// Result type alias for mpvipc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to mpv
#[derive(Debug, Error)]
pub enum Error {
    /// `open()` was called on a connection that is already open
    #[error("Connection is already open")]
    AlreadyOpen,

    /// Failed to establish the socket connection to mpv
    ///
    /// Common causes: mpv is not running, it was started without
    /// `--input-ipc-server`, or the socket path does not match.
    #[error("Failed to connect to mpv socket: {0}")]
    ConnectionFailed(String),

    /// Operation attempted on a closed connection
    ///
    /// The connection was never opened, was closed explicitly, or the
    /// stream ended. Call `open()` again before retrying.
    #[error("Connection is not open")]
    NotOpen,

    /// A command or one of its arguments could not be serialized
    #[error("Failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// Transport-level error (socket write or shutdown)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// mpv answered a command with a status other than `"success"`
    ///
    /// Contains the status string reported by mpv, e.g. `"property not found"`.
    #[error("mpv error: {0}")]
    ProtocolError(String),

    /// Timeout waiting for a response
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The pending request was dropped before a response arrived
    ///
    /// Happens when the connection closes while a call is in flight.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns true if the error means the connection is not usable until reopened
    pub fn is_disconnected(&self) -> bool {
        match self {
            Error::NotOpen | Error::ChannelClosed => true,
            Error::Context(_, inner) => inner.is_disconnected(),
            _ => false,
        }
    }
}
