//! Display renderer.
//!
//! Consumes the transport, folds each message into the [`RendererState`]
//! and pushes a fresh frame to the sink. A periodic tick re-renders even
//! when nothing arrives, so staleness shows up on a silent transport.

mod state;

pub use state::{DisplayState, RendererState};

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::render::{render_frame, LayoutOptions};
use crate::sink::{FrameSink, SinkError};
use crate::status::Message;
use crate::transport::StatusSource;

/// Wall clock used to judge staleness.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

/// Owns the renderer state and the sink.
pub struct Renderer {
    sink: Box<dyn FrameSink>,
    state: RendererState,
    options: LayoutOptions,
    tick: Duration,
    frames: u64,
    clock: Clock,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("sink", &self.sink.description())
            .field("state", &self.state.current)
            .field("tick", &self.tick)
            .field("frames", &self.frames)
            .finish()
    }
}

impl Renderer {
    pub fn new(
        sink: Box<dyn FrameSink>,
        options: LayoutOptions,
        grace_threshold: u32,
        tick: Duration,
    ) -> Self {
        Self {
            sink,
            state: RendererState::new(grace_threshold),
            options,
            tick,
            frames: 0,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    /// Frames committed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn render(&mut self) -> Result<(), SinkError> {
        let frame = render_frame(&self.state, &self.options, (self.clock)());
        self.sink.draw(&frame)?;
        self.sink.commit()?;
        self.frames += 1;
        Ok(())
    }

    /// Fold one message in and redraw.
    pub fn handle(&mut self, message: Message) -> Result<(), SinkError> {
        if let Message::Failure(marker) = &message {
            debug!(reason = ?marker.reason, "failure marker received");
        }

        let before = self.state.current;
        let after = self.state.apply(message);
        if before != after {
            info!(
                from = before.name(),
                to = after.name(),
                failures = self.state.consecutive_failures,
                "display state changed"
            );
        }
        if after == DisplayState::Error && before != DisplayState::Error {
            warn!(
                grace_threshold = self.state.grace_threshold(),
                "no usable status, showing error"
            );
        }
        self.render()
    }

    /// Run until the transport closes, then draw the final frame and close
    /// the sink. Sink errors end the loop early and are returned.
    pub async fn run(&mut self, source: &mut dyn StatusSource) -> Result<(), SinkError> {
        self.sink.initialize(self.options.geometry)?;
        info!(
            source = source.description(),
            sink = self.sink.description(),
            tick = ?self.tick,
            "renderer started"
        );

        if let Err(e) = self.drive(source).await {
            if let Err(close) = self.sink.close() {
                warn!(error = %close, "closing sink after failure also failed");
            }
            return Err(e);
        }

        self.state.shut_down();
        info!(frames = self.frames, "transport closed, drawing final frame");
        let last = self.render();
        let closed = self.sink.close();
        last.and(closed)
    }

    async fn drive(&mut self, source: &mut dyn StatusSource) -> Result<(), SinkError> {
        self.render()?;

        let mut tick = interval_at(Instant::now() + self.tick, self.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                message = source.recv() => match message {
                    Some(message) => self.handle(message)?,
                    None => return Ok(()),
                },
                _ = tick.tick() => self.render()?,
            }
        }
    }
}
