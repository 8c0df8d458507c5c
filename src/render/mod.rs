//! Layout and color engine.
//!
//! Turns the renderer state into a [`Frame`]: logical text rows plus the
//! rasterized pixel buffer a sink displays.

pub mod font;
mod frame;
mod layout;
mod palette;

pub use frame::{
    render_frame, Frame, Geometry, LayoutOptions, LINES_ROW, STATION_ROW, STATUS_ROW,
};
pub use layout::{Segment, TextRow};
pub use palette::{Palette, Rgb};
