//! Status producer.
//!
//! Polls a [`StatusProvider`] on a fixed cadence and emits exactly one
//! [`Message`] per cycle onto the transport: a [`StatusRecord`] on success,
//! a [`FailureMarker`] otherwise. Fetch failures are steady-state conditions;
//! only a stop request or a closed transport ends the loop.
//!
//! ## Submodules
//!
//! - [`client`]: STM alert feed client and normalization
//! - [`demo`]: canned scenes for running without credentials
//! - [`error`]: [`FetchError`] and its mapping to [`FailureReason`]

pub mod client;
pub mod demo;
pub mod error;

pub use client::{StmClient, StmProvider};
pub use demo::DemoProvider;
pub use error::FetchError;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::status::{FailureMarker, FailureReason, Message, StatusRecord};
use crate::transport::{Output, TransportClosed};

/// Something that can produce a normalized status record.
#[async_trait]
pub trait StatusProvider: Send + Sync + Debug {
    /// Fetch and normalize the status as of `now`.
    async fn status(&self, now: DateTime<Local>) -> Result<StatusRecord, FetchError>;

    /// Whether the network is closed at `now`, which slows polling down.
    fn is_closed(&self, _now: DateTime<Local>) -> bool {
        false
    }

    /// Returns a human-readable description of the provider.
    fn description(&self) -> &str;
}

/// Producer cadence and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerTiming {
    /// Interval between cycles while trains run.
    pub refresh: Duration,
    /// Interval between cycles while the network is closed.
    pub closed_refresh: Duration,
    /// Upper bound on one fetch.
    pub fetch_timeout: Duration,
}

impl Default for ProducerTiming {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(30),
            closed_refresh: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// The producer loop.
#[derive(Debug)]
pub struct Producer {
    provider: Box<dyn StatusProvider>,
    timing: ProducerTiming,
}

impl Producer {
    pub fn new(provider: Box<dyn StatusProvider>, timing: ProducerTiming) -> Self {
        Self { provider, timing }
    }

    pub fn timing(&self) -> ProducerTiming {
        self.timing
    }

    /// Run one fetch and classify the outcome. Never fails.
    pub async fn next_message(&self) -> Message {
        let now = Local::now();
        let fetch = tokio::time::timeout(self.timing.fetch_timeout, self.provider.status(now));

        let reason = match fetch.await {
            Ok(Ok(record)) => {
                debug!(
                    period = %record.period_label,
                    lines = record.lines.len(),
                    "status fetched"
                );
                for line in record.lines.iter().filter(|l| l.alert_text.is_some()) {
                    info!(line = %line.line_code, alert = ?line.alert_text, "line under alert");
                }
                return Message::Status(record);
            }
            Ok(Err(e)) => {
                let reason = e.reason();
                warn!(error = %e, ?reason, "status fetch failed");
                reason
            }
            Err(_) => {
                warn!(timeout = ?self.timing.fetch_timeout, "status fetch timed out");
                FailureReason::Timeout
            }
        };
        Message::Failure(FailureMarker::new(reason, now.with_timezone(&Utc)))
    }

    /// Fetch once and emit the result.
    pub async fn run_cycle(&self, output: &mut Output) -> Result<(), TransportClosed> {
        let message = self.next_message().await;
        output.send(message).await
    }

    fn next_delay(&self) -> Duration {
        if self.provider.is_closed(Local::now()) {
            self.timing.closed_refresh
        } else {
            self.timing.refresh
        }
    }

    /// Run until `stop` flips to `true` or the transport closes.
    ///
    /// The output is dropped on return, which the renderer observes as end
    /// of stream.
    pub async fn run(self, mut output: Output, mut stop: watch::Receiver<bool>) {
        info!(
            source = self.provider.description(),
            refresh = ?self.timing.refresh,
            "producer started"
        );

        loop {
            let started = Instant::now();
            tokio::select! {
                result = self.run_cycle(&mut output) => {
                    if result.is_err() {
                        info!("transport closed, producer stopping");
                        break;
                    }
                }
                _ = stopped(&mut stop) => break,
            }

            tokio::select! {
                _ = tokio::time::sleep_until(started + self.next_delay()) => {}
                _ = stopped(&mut stop) => break,
            }
        }

        drop(output);
        info!("producer stopped");
    }
}

/// Resolves once a stop is requested or the stop sender is gone.
pub(crate) async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{FrequencyRange, LineStatus, ServiceLevel};
    use crate::transport::{ChannelSource, StatusSource};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Step {
        Ok,
        Fail(fn() -> FetchError),
        Hang,
    }

    #[derive(Debug)]
    struct ScriptedProvider {
        steps: Mutex<VecDeque<Step>>,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Box<Self> {
            Box::new(Self {
                steps: Mutex::new(steps.into()),
            })
        }
    }

    #[async_trait]
    impl StatusProvider for ScriptedProvider {
        async fn status(&self, now: DateTime<Local>) -> Result<StatusRecord, FetchError> {
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Ok);
            match step {
                Step::Ok => Ok(StatusRecord {
                    station_name: "Berri-UQAM".to_string(),
                    period_label: "Weekend".to_string(),
                    lines: vec![LineStatus::new(
                        "G",
                        FrequencyRange::new(4, 8).unwrap(),
                        ServiceLevel::Reduced,
                    )],
                    fetched_at: now.with_timezone(&Utc),
                }),
                Step::Fail(make) => Err(make()),
                Step::Hang => std::future::pending().await,
            }
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn reason_of(message: &Message) -> Option<FailureReason> {
        match message {
            Message::Failure(marker) => Some(marker.reason),
            Message::Status(_) => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_message_classifies_failures() {
        let producer = Producer::new(
            ScriptedProvider::new(vec![
                Step::Ok,
                Step::Fail(|| FetchError::Connection("refused".into())),
                Step::Fail(|| FetchError::Parse("eof".into())),
                Step::Hang,
            ]),
            ProducerTiming::default(),
        );

        assert_eq!(reason_of(&producer.next_message().await), None);
        assert_eq!(
            reason_of(&producer.next_message().await),
            Some(FailureReason::Network)
        );
        assert_eq!(
            reason_of(&producer.next_message().await),
            Some(FailureReason::UpstreamFormat)
        );
        assert_eq!(
            reason_of(&producer.next_message().await),
            Some(FailureReason::Timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_emits_one_message_per_cycle_in_order() {
        let producer = Producer::new(
            ScriptedProvider::new(vec![
                Step::Ok,
                Step::Fail(|| FetchError::Timeout),
                Step::Ok,
            ]),
            ProducerTiming::default(),
        );
        let (output, mut source) = ChannelSource::create(2, "test");
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(producer.run(output, stop_rx));

        let first = source.recv().await.unwrap();
        let second = source.recv().await.unwrap();
        let third = source.recv().await.unwrap();
        assert!(matches!(first, Message::Status(_)));
        assert_eq!(reason_of(&second), Some(FailureReason::Timeout));
        assert!(matches!(third, Message::Status(_)));

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_closes_transport() {
        let producer = Producer::new(ScriptedProvider::new(vec![]), ProducerTiming::default());
        let (output, mut source) = ChannelSource::create(1, "test");
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(producer.run(output, stop_rx));

        assert!(source.recv().await.is_some());
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        assert!(source.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_in_flight_fetch() {
        let producer = Producer::new(
            ScriptedProvider::new(vec![Step::Hang]),
            ProducerTiming {
                fetch_timeout: Duration::from_secs(3600),
                ..ProducerTiming::default()
            },
        );
        let (output, mut source) = ChannelSource::create(1, "test");
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(producer.run(output, stop_rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        stop_tx.send(true).unwrap();
        task.await.unwrap();
        assert!(source.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_stops_when_renderer_is_gone() {
        let producer = Producer::new(ScriptedProvider::new(vec![]), ProducerTiming::default());
        let (output, source) = ChannelSource::create(1, "test");
        let (_stop_tx, stop_rx) = watch::channel(false);
        drop(source);

        // Returns on its own after the first failed send
        producer.run(output, stop_rx).await;
    }
}
