// Platform dialer for mpv's IPC server
//
// mpv listens on a Unix domain socket (`--input-ipc-server=/tmp/mpvsocket`)
// or, on Windows, a named pipe (`--input-ipc-server=\\.\pipe\mpvsocket`).

use super::{BoxedReader, BoxedWriter, Dialer};
use crate::{Error, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Dials mpv's IPC socket at a fixed path
#[derive(Debug, Clone)]
pub struct IpcSocketDialer {
    path: PathBuf,
}

impl IpcSocketDialer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
async fn connect(path: &Path) -> std::io::Result<(BoxedReader, BoxedWriter)> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    let (reader, writer) = stream.into_split();
    Ok((Box::new(reader), Box::new(writer)))
}

#[cfg(windows)]
async fn connect(path: &Path) -> std::io::Result<(BoxedReader, BoxedWriter)> {
    use tokio::net::windows::named_pipe::ClientOptions;

    let pipe = ClientOptions::new().open(path)?;
    let (reader, writer) = tokio::io::split(pipe);
    Ok((Box::new(reader), Box::new(writer)))
}

impl Dialer for IpcSocketDialer {
    fn dial(&self) -> Pin<Box<dyn Future<Output = Result<(BoxedReader, BoxedWriter)>> + Send + '_>> {
        Box::pin(async move {
            tracing::debug!("Dialing mpv socket at {}", self.path.display());

            connect(&self.path).await.map_err(|e| {
                Error::ConnectionFailed(format!("{}: {}", self.path.display(), e))
            })
        })
    }
}
