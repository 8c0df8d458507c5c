//! Stream-based transport source.
//!
//! Reads line-delimited JSON from an async reader (a pipe from a separate
//! producer process, typically stdin) and hands decoded messages to the
//! renderer. End of input closes the stream.

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::wire::decode_line;
use super::StatusSource;
use crate::status::{FailureMarker, FailureReason, Message};

/// A source that decodes messages from an async byte stream.
///
/// A background task reads lines and forwards them through a one-slot
/// channel, so a slow renderer pushes back on the reader.
///
/// # Example
///
/// ```no_run
/// use metro_panel::transport::StreamSource;
///
/// # async fn demo() {
/// let source = StreamSource::spawn(tokio::io::stdin(), "stdin");
/// # }
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Message>,
    description: String,
    reader: AbortHandle,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(pump_lines(reader, tx));

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            reader: task.abort_handle(),
        }
    }

    /// Handle that stops the reader task, which ends the stream.
    pub fn abort_handle(&self) -> AbortHandle {
        self.reader.clone()
    }
}

/// Forward decoded lines until input ends, a read fails or nobody listens.
///
/// Lines are read as raw bytes; one that is not UTF-8 counts as a malformed
/// record, not as the end of the stream.
async fn pump_lines<R>(reader: R, tx: mpsc::Sender<Message>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!("transport stream reached end of input");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "transport stream read failed");
                return;
            }
        }

        let message = match std::str::from_utf8(&buf) {
            Ok(text) => decode_line(text, Utc::now()),
            Err(e) => {
                warn!(error = %e, "transport line is not UTF-8");
                Some(Message::Failure(FailureMarker::new(
                    FailureReason::UpstreamFormat,
                    Utc::now(),
                )))
            }
        };
        if let Some(message) = message {
            if tx.send(message).await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl StatusSource for StreamSource {
    async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn weekend_line() -> &'static str {
        r#"{"kind":"status","station_name":"Berri-UQAM","period_label":"Weekend","lines":[{"line_code":"G","frequency_range":{"min":4,"max":8},"service_level":"reduced"}],"fetched_at":"2026-10-17T14:00:00Z"}"#
    }

    #[tokio::test]
    async fn test_each_line_becomes_a_message() {
        let data = format!("{}\n\n{}\n", weekend_line(), weekend_line());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        for _ in 0..2 {
            let Some(Message::Status(record)) = source.recv().await else {
                panic!("expected status");
            };
            assert_eq!(record.station_name, "Berri-UQAM");
        }
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_line_becomes_format_failure() {
        let mut source = StreamSource::spawn(Cursor::new("not valid json\n"), "test");

        let Some(Message::Failure(marker)) = source.recv().await else {
            panic!("expected failure marker");
        };
        assert_eq!(marker.reason, FailureReason::UpstreamFormat);
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_non_utf8_line_does_not_end_stream() {
        let mut data = vec![0xff, 0xfe, b'x', b'\n'];
        data.extend_from_slice(weekend_line().as_bytes());
        data.push(b'\n');
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        let Some(Message::Failure(marker)) = source.recv().await else {
            panic!("expected failure marker");
        };
        assert_eq!(marker.reason, FailureReason::UpstreamFormat);
        let Some(Message::Status(record)) = source.recv().await else {
            panic!("expected status after the bad line");
        };
        assert_eq!(record.period_label, "Weekend");
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_input_ends_immediately() {
        let mut source = StreamSource::spawn(Cursor::new(""), "test");
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_abort_ends_stream() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut source = StreamSource::spawn(reader, "pipe");
        source.abort_handle().abort();
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_description_names_the_stream() {
        let source = StreamSource::spawn(Cursor::new(""), "stdin");
        assert_eq!(source.description(), "stream: stdin");
    }
}
