//! In-memory sink.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{check_bounds, FrameSink, SinkError};
use crate::render::{Frame, Geometry, Rgb};

#[derive(Debug, Default)]
struct Recorded {
    frames: Vec<Frame>,
    closed: bool,
}

/// Records every committed frame.
///
/// Clones share the recording, so a test can keep one handle and give the
/// other to the renderer.
///
/// # Example
///
/// ```
/// use metro_panel::sink::{FrameSink, MemorySink};
/// use metro_panel::render::Geometry;
///
/// let sink = MemorySink::new();
/// let mut handle = sink.clone();
/// handle.initialize(Geometry::default()).unwrap();
/// assert!(sink.frames().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
    geometry: Option<Geometry>,
    pending: Option<Frame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        // A poisoned lock only means a test panicked mid-commit
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Committed frames, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        self.recorded().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.recorded().frames.last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.recorded().closed
    }
}

impl FrameSink for MemorySink {
    fn initialize(&mut self, geometry: Geometry) -> Result<(), SinkError> {
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Validated only; whole frames are what gets recorded.
    fn set_pixel(&mut self, x: u32, y: u32, _color: Rgb) -> Result<(), SinkError> {
        check_bounds(self.geometry, x, y)
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if self.geometry.is_none() {
            return Err(SinkError::Uninitialized);
        }
        self.pending = Some(frame.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        if let Some(frame) = self.pending.take() {
            self.recorded().frames.push(frame);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.recorded().closed = true;
        Ok(())
    }

    fn description(&self) -> &str {
        "memory"
    }
}
