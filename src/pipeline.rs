//! Wiring between producer, transport and renderer.
//!
//! Three ways to run:
//!
//! - [`run_in_process`]: producer task and renderer joined by a bounded
//!   in-memory channel
//! - [`run_producer`]: producer only, wire format on stdout
//! - [`run_display`]: renderer only, wire format from stdin
//!
//! [`supervise`] bounds how long an orderly shutdown may take once a
//! termination signal arrives.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{ConfigError, PanelConfig};
use crate::error::{PanelError, Result};
use crate::producer::{DemoProvider, Producer, StatusProvider, StmClient, StmProvider};
use crate::renderer::Renderer;
use crate::sink::{FrameSink, SinkError};
use crate::transport::{ChannelSource, Output, StreamSource};

/// Pick the status provider the configuration asks for.
pub fn build_provider(config: &PanelConfig) -> Result<Box<dyn StatusProvider>> {
    if config.demo {
        return Ok(Box::new(DemoProvider::new(
            config.station,
            config.display_name.clone(),
        )));
    }

    let (api_key, api_secret) = config
        .credentials
        .clone()
        .ok_or(ConfigError::Credentials)?;
    let client = StmClient::builder()
        .endpoint(config.endpoint.clone())
        .credentials(api_key, api_secret)
        .timeout(config.timing.fetch_timeout)
        .build()
        .map_err(|e| PanelError::Other(anyhow::anyhow!("failed to build STM client: {}", e)))?;

    Ok(Box::new(StmProvider::new(
        client,
        config.station,
        config.display_name.clone(),
        config.schedule.clone(),
    )))
}

pub fn build_producer(config: &PanelConfig) -> Result<Producer> {
    Ok(Producer::new(build_provider(config)?, config.timing))
}

/// Renderer ticking on the refresh interval.
pub fn build_renderer(config: &PanelConfig, sink: Box<dyn FrameSink>) -> Renderer {
    Renderer::new(
        sink,
        config.layout_options(),
        config.grace_threshold,
        config.timing.refresh,
    )
}

/// Run producer and renderer in this process until `stop` fires and the
/// final frame is drawn.
pub async fn run_in_process(
    producer: Producer,
    renderer: &mut Renderer,
    capacity: usize,
    stop: watch::Receiver<bool>,
) -> std::result::Result<(), SinkError> {
    let (output, mut source) = ChannelSource::create(capacity, "producer");
    let producer = tokio::spawn(producer.run(output, stop));

    let result = renderer.run(&mut source).await;
    if result.is_err() {
        producer.abort();
    } else if let Err(e) = producer.await {
        warn!(error = %e, "producer task failed");
    }
    result
}

/// Run the producer alone, writing one JSON record per line to stdout.
pub async fn run_producer(producer: Producer, stop: watch::Receiver<bool>) {
    producer.run(Output::stream(tokio::io::stdout()), stop).await;
}

/// Run the renderer alone, reading records from stdin.
///
/// `stop` ends the stream as if the producer had gone away.
pub async fn run_display(
    renderer: &mut Renderer,
    mut stop: watch::Receiver<bool>,
) -> std::result::Result<(), SinkError> {
    let mut source = StreamSource::spawn(tokio::io::stdin(), "stdin");
    let reader = source.abort_handle();
    let watcher = tokio::spawn(async move {
        crate::producer::stopped(&mut stop).await;
        reader.abort();
    });

    let result = renderer.run(&mut source).await;
    watcher.abort();
    result
}

/// Drive `work` to completion, or on `signal` call `on_signal` and give
/// `work` at most `grace` to finish. `None` means the grace ran out.
pub async fn supervise<F, S>(
    work: F,
    signal: S,
    on_signal: impl FnOnce(),
    grace: Duration,
) -> Option<F::Output>
where
    F: Future,
    S: Future<Output = ()>,
{
    tokio::pin!(work);
    tokio::select! {
        output = &mut work => Some(output),
        _ = signal => {
            info!(grace = ?grace, "shutdown requested");
            on_signal();
            match tokio::time::timeout(grace, work).await {
                Ok(output) => Some(output),
                Err(_) => {
                    warn!(grace = ?grace, "shutdown did not finish in time");
                    None
                }
            }
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
