// mpv transport layer
//
// Handles the byte stream between this client and mpv.
// - LineTransportReceiver: newline-delimited reading; send_line frames writes
// - IpcSocketDialer: mpv's `--input-ipc-server` socket (Unix socket or Windows named pipe)

use crate::Result;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

pub mod line;
pub mod socket;

pub use line::{LineTransportReceiver, send_line};
pub use socket::IpcSocketDialer;

/// Read half of a dialed stream
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half of a dialed stream
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Establishes the byte stream a `Connection` runs on
pub trait Dialer: Send + Sync {
    fn dial(&self) -> Pin<Box<dyn Future<Output = Result<(BoxedReader, BoxedWriter)>> + Send + '_>>;
}

/// Trait for the sending half of a transport
pub trait TransportSender: Send + Unpin {
    /// Write one already-framed line
    fn send<'a>(&'a mut self, line: &'a [u8])
    -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Shut the write direction down
    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Trait for the receiving half of a transport
pub trait TransportReceiver: Send + Unpin {
    /// Run the receive loop until EOF or a read error
    fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
