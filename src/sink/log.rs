//! Headless sink that writes frames to the log.
//!
//! Useful on hosts without a panel attached. Frames whose text did not
//! change since the previous commit are logged at debug level only.

use tracing::{debug, info};

use super::{check_bounds, FrameSink, SinkError};
use crate::render::{Frame, Geometry, Rgb, LINES_ROW, STATION_ROW, STATUS_ROW};
use crate::renderer::DisplayState;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    state: DisplayState,
    rows: [String; 3],
    stale: bool,
    offline: bool,
}

impl Snapshot {
    fn of(frame: &Frame) -> Self {
        Self {
            state: frame.state,
            rows: [
                frame.row_text(STATION_ROW),
                frame.row_text(STATUS_ROW),
                frame.row_text(LINES_ROW),
            ],
            stale: frame.stale,
            offline: frame.offline,
        }
    }
}

/// Logs the logical rows of each committed frame.
#[derive(Debug, Default)]
pub struct LogSink {
    geometry: Option<Geometry>,
    pending: Option<Snapshot>,
    last: Option<Snapshot>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for LogSink {
    fn initialize(&mut self, geometry: Geometry) -> Result<(), SinkError> {
        info!(
            width = geometry.width,
            height = geometry.height,
            "log sink ready"
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, _color: Rgb) -> Result<(), SinkError> {
        check_bounds(self.geometry, x, y)
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if self.geometry.is_none() {
            return Err(SinkError::Uninitialized);
        }
        self.pending = Some(Snapshot::of(frame));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let Some(snapshot) = self.pending.take() else {
            return Ok(());
        };
        let [station, status, lines] = &snapshot.rows;

        if self.last.as_ref() == Some(&snapshot) {
            debug!(state = snapshot.state.name(), "frame unchanged");
        } else {
            info!(
                state = snapshot.state.name(),
                station = %station,
                status = %status,
                lines = %lines,
                stale = snapshot.stale,
                offline = snapshot.offline,
                "frame"
            );
        }
        self.last = Some(snapshot);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        info!("log sink closed");
        Ok(())
    }

    fn description(&self) -> &str {
        "log"
    }
}
