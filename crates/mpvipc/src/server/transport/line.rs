use super::{TransportReceiver, TransportSender};
use crate::{Error, Result};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Write one newline-terminated line and flush it
pub async fn send_line<W>(writer: &mut W, line: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer
        .write_all(line)
        .await
        .map_err(|e| Error::TransportError(format!("Failed to write command: {}", e)))?;

    writer
        .flush()
        .await
        .map_err(|e| Error::TransportError(format!("Failed to flush: {}", e)))?;

    Ok(())
}

/// Reads newline-delimited lines from mpv and forwards them over a channel.
///
/// The write direction needs no framing state: any `AsyncWrite` is a
/// [`TransportSender`] through [`send_line`].
pub struct LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    reader: BufReader<R>,
    message_tx: mpsc::UnboundedSender<String>,
}

impl<R> LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps `reader`; the returned channel yields each line without its terminator
    pub fn new(reader: R) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let receiver = Self {
            reader: BufReader::new(reader),
            message_tx,
        };

        (receiver, message_rx)
    }

    /// Run the line read loop.
    ///
    /// Returns `Ok(())` on EOF or when the consumer hangs up.
    pub async fn run_loop(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity(4096);

        loop {
            buf.clear();

            let n = self
                .reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| Error::TransportError(format!("Failed to read line: {}", e)))?;

            if n == 0 {
                break;
            }

            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }

            if buf.is_empty() {
                continue;
            }

            let line = String::from_utf8_lossy(&buf).into_owned();
            if self.message_tx.send(line).is_err() {
                break;
            }
        }

        Ok(())
    }
}

impl<W> TransportSender for W
where
    W: AsyncWrite + Unpin + Send,
{
    fn send<'a>(
        &'a mut self,
        line: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { send_line(self, line).await })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.shutdown()
                .await
                .map_err(|e| Error::TransportError(format!("Failed to close socket: {}", e)))
        })
    }
}

impl<R> TransportReceiver for LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.run_loop().await })
    }
}
