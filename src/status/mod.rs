//! Status data model.
//!
//! - [`record`]: the values carried by the transport ([`StatusRecord`],
//!   [`FailureMarker`], [`Message`])
//! - [`schedule`]: period and operating-hours computation
//! - [`station`]: the built-in station catalog and frequency tables

pub mod record;
pub mod schedule;
pub mod station;

pub use record::{
    FailureMarker, FailureReason, FrequencyRange, LineStatus, Message, ServiceLevel, StatusRecord,
};
pub use schedule::{Period, Schedule};
pub use station::{LineSpec, Station};
