//! Frame sinks.
//!
//! A sink is whatever finally shows a [`Frame`]: an LED matrix driver, a
//! terminal preview, a log, or memory in tests. The renderer only relies on
//! the [`FrameSink`] contract.
//!
//! - [`TerminalSink`]: half-block preview of the panel in a terminal
//! - [`LogSink`]: the logical rows of each frame through `tracing`
//! - [`MemorySink`]: records committed frames for inspection

mod log;
mod memory;
mod terminal;

pub use self::log::LogSink;
pub use memory::MemorySink;
pub use terminal::TerminalSink;

use std::io;

use thiserror::Error;

use crate::render::{Frame, Geometry, Rgb};

/// Failures of the frame sink. All of them are fatal to the renderer.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to initialize frame sink: {0}")]
    Init(String),

    #[error("frame sink I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame sink used before initialize")]
    Uninitialized,

    #[error("pixel ({x}, {y}) outside {width}x{height} panel")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Minimal contract between the renderer and a display.
pub trait FrameSink: Send {
    /// Prepare a panel of the given size. Called once before any drawing.
    fn initialize(&mut self, geometry: Geometry) -> Result<(), SinkError>;

    /// Write one pixel into the back buffer.
    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) -> Result<(), SinkError>;

    /// Write a whole frame into the back buffer.
    fn draw(&mut self, frame: &Frame) -> Result<(), SinkError> {
        for (x, y, color) in frame.pixels() {
            self.set_pixel(x, y, color)?;
        }
        Ok(())
    }

    /// Swap the back buffer onto the display.
    fn commit(&mut self) -> Result<(), SinkError>;

    /// Release the display. No calls follow.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Returns a human-readable description of the sink.
    fn description(&self) -> &str;
}

/// Bounds check shared by the sinks.
pub(crate) fn check_bounds(
    geometry: Option<Geometry>,
    x: u32,
    y: u32,
) -> Result<(), SinkError> {
    let geometry = geometry.ok_or(SinkError::Uninitialized)?;
    if geometry.contains(x, y) {
        Ok(())
    } else {
        Err(SinkError::OutOfBounds {
            x,
            y,
            width: geometry.width,
            height: geometry.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        let geometry = Some(Geometry::new(64, 32));
        assert!(check_bounds(geometry, 63, 31).is_ok());
        assert!(matches!(
            check_bounds(geometry, 64, 0),
            Err(SinkError::OutOfBounds { x: 64, .. })
        ));
        assert!(matches!(
            check_bounds(None, 0, 0),
            Err(SinkError::Uninitialized)
        ));
    }
}
