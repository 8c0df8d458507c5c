//! Ordered transport between the producer and the renderer.
//!
//! The producer writes through an [`Output`]; the renderer reads from a
//! [`StatusSource`]. Two realizations are provided:
//!
//! - [`ChannelSource`]: a bounded in-memory channel for a single process
//! - [`StreamSource`] + [`Output::stream`]: line-delimited JSON over a pipe,
//!   for running producer and renderer as separate processes
//!
//! End of stream (`recv` returning `None`) is distinct from a failure
//! marker: it means the producer is gone.

mod channel;
mod stream;
pub mod wire;

pub use channel::ChannelSource;
pub use stream::StreamSource;

use std::fmt::{self, Debug};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::error;

use crate::status::Message;

/// The receiving side has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transport closed")]
pub struct TransportClosed;

/// Receiving end of the transport.
///
/// Implementations must be cancellation safe: dropping a pending `recv`
/// future loses no message.
#[async_trait]
pub trait StatusSource: Send + Debug {
    /// Wait for the next message. `None` means end of stream.
    async fn recv(&mut self) -> Option<Message>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// Sending end of the transport.
pub enum Output {
    /// Send through an in-process bounded channel.
    ///
    /// Use [`ChannelSource::create`] to get this variant with its receiver.
    Channel(mpsc::Sender<Message>),

    /// Write newline-delimited JSON to a byte stream.
    Stream(Box<dyn AsyncWrite + Unpin + Send>),
}

impl Output {
    /// Create a stream output, e.g. over stdout.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use metro_panel::transport::Output;
    ///
    /// let output = Output::stream(tokio::io::stdout());
    /// ```
    pub fn stream<W>(writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Output::Stream(Box::new(writer))
    }

    /// Deliver one message, waiting while the transport is full.
    pub async fn send(&mut self, message: Message) -> Result<(), TransportClosed> {
        match self {
            Output::Channel(tx) => tx.send(message).await.map_err(|_| TransportClosed),
            Output::Stream(writer) => {
                let mut line = match wire::encode_line(&message) {
                    Ok(line) => line,
                    Err(e) => {
                        error!(error = %e, "failed to encode message, dropping it");
                        return Ok(());
                    }
                };
                line.push('\n');
                writer
                    .write_all(line.as_bytes())
                    .await
                    .map_err(|_| TransportClosed)?;
                writer.flush().await.map_err(|_| TransportClosed)
            }
        }
    }
}

impl Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Channel(tx) => f.debug_tuple("Channel").field(tx).finish(),
            Output::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{FailureMarker, FailureReason};
    use chrono::Utc;

    #[tokio::test]
    async fn test_stream_output_feeds_stream_source() {
        let (writer, reader) = tokio::io::duplex(1024);
        let mut output = Output::stream(writer);
        let mut source = StreamSource::spawn(reader, "duplex");

        let marker = FailureMarker::new(FailureReason::Timeout, Utc::now());
        output.send(Message::Failure(marker)).await.unwrap();
        drop(output);

        assert_eq!(source.recv().await, Some(Message::Failure(marker)));
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_output_reports_closed_pipe() {
        let (writer, reader) = tokio::io::duplex(8);
        drop(reader);
        let mut output = Output::stream(writer);

        let marker = FailureMarker::new(FailureReason::Network, Utc::now());
        assert_eq!(output.send(Message::Failure(marker)).await, Err(TransportClosed));
    }
}
