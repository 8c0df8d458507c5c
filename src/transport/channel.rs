//! In-memory transport.
//!
//! A bounded tokio mpsc channel between a producer task and the renderer in
//! the same process. Closure of the sending half is the end-of-stream signal.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Output, StatusSource};
use crate::status::Message;

/// Receiving end of an in-process transport.
///
/// # Example
///
/// ```
/// use metro_panel::transport::ChannelSource;
///
/// let (output, source) = ChannelSource::create(2, "in-process");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Message>,
    description: String,
}

impl ChannelSource {
    /// Wrap an existing receiver.
    pub fn new(receiver: mpsc::Receiver<Message>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a connected `(Output, ChannelSource)` pair.
    ///
    /// `capacity` is clamped to at least one slot.
    pub fn create(capacity: usize, source_description: &str) -> (Output, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Output::Channel(tx), Self::new(rx, source_description))
    }
}

#[async_trait]
impl StatusSource for ChannelSource {
    async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
