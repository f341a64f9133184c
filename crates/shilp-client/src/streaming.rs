//! Binary body streams and server-push event subscriptions.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shilp_core::defaults::EVENT_CHANNEL_CAPACITY;
use shilp_core::{Error, Result};

type ChunkStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Lazily consumed response body.
///
/// Each chunk must arrive within the idle timeout. Dropping the stream closes
/// the underlying connection whether or not the body was read to the end.
pub struct ByteStream {
    inner: ChunkStream,
    idle_timeout: Duration,
    bytes_read: u64,
}

impl ByteStream {
    pub(crate) fn new(response: reqwest::Response, idle_timeout: Duration) -> Self {
        Self::from_stream(response.bytes_stream(), idle_timeout)
    }

    pub(crate) fn from_stream(
        stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Box::pin(stream),
            idle_timeout,
            bytes_read: 0,
        }
    }

    /// Next chunk of the body, or `None` once the server finished sending.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        match tokio::time::timeout(self.idle_timeout, self.inner.next()).await {
            Ok(Some(Ok(chunk))) => {
                self.bytes_read += chunk.len() as u64;
                Some(Ok(chunk))
            }
            Ok(Some(Err(e))) => Some(Err(e.into())),
            Ok(None) => None,
            Err(_) => Some(Err(Error::Timeout(format!(
                "no data received for {:?} after {} bytes",
                self.idle_timeout, self.bytes_read
            )))),
        }
    }

    /// Bytes received so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Pipe the remaining body into `writer` and return the total byte count.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(chunk) = self.next_chunk().await {
            writer.write_all(&chunk?).await?;
        }
        writer.flush().await?;
        debug!(bytes = self.bytes_read, "Stream copied");
        Ok(self.bytes_read)
    }

    /// Buffer the remaining body in memory.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("idle_timeout", &self.idle_timeout)
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

/// Splits a byte stream into text lines.
///
/// Lines may span chunk boundaries. A trailing `\r` is removed and blank
/// lines are skipped.
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos;
            if let Some(line) = decode_line(&self.buf[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        lines
    }

    /// Flush an unterminated final line.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = String::from_utf8_lossy(raw);
    if line.trim().is_empty() {
        None
    } else {
        Some(line.into_owned())
    }
}

/// Subscription to a newline-delimited server-push stream.
///
/// A background task reads the response and forwards each line through a
/// bounded channel, so a slow consumer applies back-pressure to the socket.
/// After [`cancel`](Self::cancel) or drop, no further events are delivered.
pub struct EventSubscription {
    rx: mpsc::Receiver<Result<String>>,
    reader: JoinHandle<()>,
    cancelled: bool,
}

impl EventSubscription {
    pub(crate) fn spawn(response: reqwest::Response) -> Self {
        Self::from_stream(response.bytes_stream())
    }

    pub(crate) fn from_stream(
        stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let reader = tokio::spawn(read_events(Box::pin(stream), tx));
        Self {
            rx,
            reader,
            cancelled: false,
        }
    }

    /// Next event in arrival order. `None` once the server closed the stream
    /// or the subscription was cancelled.
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.cancelled {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop the reader task and discard undelivered events.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            debug!("Cancelling event subscription");
            self.cancelled = true;
            self.reader.abort();
            self.rx.close();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

async fn read_events(mut stream: ChunkStream, tx: mpsc::Sender<Result<String>>) {
    let mut decoder = LineDecoder::default();
    let mut delivered = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, delivered, "Event stream failed");
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        };

        for line in decoder.push(&chunk) {
            if tx.send(Ok(line)).await.is_err() {
                // Consumer went away
                return;
            }
            delivered += 1;
        }
    }

    if let Some(line) = decoder.finish() {
        if tx.send(Ok(line)).await.is_ok() {
            delivered += 1;
        }
    }
    debug!(delivered, "Event stream closed by server");
}
