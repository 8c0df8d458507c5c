//! # metro-panel
//!
//! Real-time metro line status for one station, drawn on a small RGB LED
//! matrix (64x32 by default).
//!
//! A producer polls the transit status source on a fixed interval and
//! emits one normalized record, or a failure marker, per cycle. A renderer
//! folds those messages into a small state machine and draws every frame
//! with a fixed layout and color policy. Upstream outages degrade the panel
//! gracefully instead of blanking it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐  │
//! │  │ producer │───▶│ transport │───▶│ renderer │───▶│   sink   │  │
//! │  │ (fetch)  │    │ (ordered) │    │ (state)  │    │ (pixels) │  │
//! │  └────┬─────┘    └───────────┘    └────┬─────┘    └──────────┘  │
//! │       │                                │                        │
//! │       ▼                                ▼                        │
//! │  ┌──────────┐                     ┌──────────┐                  │
//! │  │  status  │ records, schedule   │  render  │ layout, font     │
//! │  └──────────┘                     └──────────┘                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`status`]**: [`StatusRecord`], [`FailureMarker`] and the [`Message`]
//!   carrying either; the weekday/weekend/holiday schedule; built-in stations
//! - **[`producer`]**: the polling loop, the STM alert client and a demo
//!   provider; failures are classified, never propagated
//! - **[`transport`]**: an in-memory channel or line-delimited JSON over a
//!   pipe, both ordered with backpressure
//! - **[`renderer`]**: the NORMAL / RECOVERING / ERROR state machine and the
//!   render loop with its periodic tick
//! - **[`render`]**: text budgeting, colors and the 5x7 font
//! - **[`sink`]**: the [`FrameSink`] contract plus terminal, log and memory
//!   sinks
//!
//! ## Usage
//!
//! ```bash
//! # Producer and renderer in one process, previewed in the terminal
//! metro-panel --station berri-uqam
//!
//! # Without credentials
//! metro-panel --station berri-uqam --demo
//!
//! # As two processes joined by a pipe
//! metro-panel --station berri-uqam produce | metro-panel --station berri-uqam display
//! ```
//!
//! ### As a library
//!
//! ```
//! use chrono::Utc;
//! use metro_panel::render::{render_frame, LayoutOptions, LINES_ROW};
//! use metro_panel::renderer::RendererState;
//! use metro_panel::status::{FrequencyRange, LineStatus, ServiceLevel, StatusRecord};
//!
//! let mut state = RendererState::new(3);
//! state.apply(
//!     StatusRecord {
//!         station_name: "BERRI-UQAM".to_string(),
//!         period_label: "Weekend".to_string(),
//!         lines: vec![LineStatus::new(
//!             "G",
//!             FrequencyRange::new(4, 8).unwrap(),
//!             ServiceLevel::Normal,
//!         )],
//!         fetched_at: Utc::now(),
//!     }
//!     .into(),
//! );
//!
//! let frame = render_frame(&state, &LayoutOptions::default(), Utc::now());
//! assert_eq!(frame.row_text(LINES_ROW), "G:4-8m N");
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod producer;
pub mod render;
pub mod renderer;
pub mod sink;
pub mod status;
pub mod transport;

pub use config::{ConfigError, PanelConfig};
pub use error::PanelError;
pub use producer::{Producer, StatusProvider};
pub use render::{render_frame, Frame, Geometry};
pub use renderer::{DisplayState, Renderer, RendererState};
pub use sink::{FrameSink, SinkError};
pub use status::{FailureMarker, FailureReason, Message, StatusRecord};
pub use transport::StatusSource;
