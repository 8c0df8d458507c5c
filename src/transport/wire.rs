//! Line-delimited JSON wire format.
//!
//! One [`Message`] per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"status","station_name":"Berri-UQAM","period_label":"Weekend","lines":[...],"fetched_at":"..."}
//! {"kind":"failure","reason":"timeout","occurred_at":"..."}
//! ```

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::status::{FailureMarker, FailureReason, Message};

/// Encode a message as a single line, without the trailing newline.
pub fn encode_line(message: &Message) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

/// Decode one line.
///
/// Blank lines yield `None`. Anything unparseable becomes an
/// `UpstreamFormat` failure stamped with `now`, never an error.
pub fn decode_line(line: &str, now: DateTime<Utc>) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Message>(line) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, "unparseable transport line");
            Some(Message::Failure(FailureMarker::new(
                FailureReason::UpstreamFormat,
                now,
            )))
        }
    }
}
