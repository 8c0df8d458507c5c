//! Normalized status snapshot types.
//!
//! These are the values that travel from the producer to the renderer.
//! They serialize to the line-delimited JSON wire format used when the
//! two halves run as separate processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service level of one line, driving its color and abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLevel {
    /// Regular weekday service.
    Normal,
    /// Weekend or holiday schedule.
    #[serde(alias = "weekend")]
    Reduced,
    /// An upstream alert names this line.
    Alert,
}

impl ServiceLevel {
    /// One-character abbreviation shown after the frequency.
    pub fn abbrev(self) -> &'static str {
        match self {
            ServiceLevel::Normal => "N",
            ServiceLevel::Reduced => "W",
            ServiceLevel::Alert => "!",
        }
    }
}

/// Expected wait between trains, in whole minutes.
///
/// `min <= max` holds for every value, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr")]
pub struct FrequencyRange {
    pub min: u16,
    pub max: u16,
}

#[derive(Deserialize)]
struct RangeRepr {
    min: u16,
    max: u16,
}

impl TryFrom<RangeRepr> for FrequencyRange {
    type Error = String;

    fn try_from(repr: RangeRepr) -> Result<Self, Self::Error> {
        FrequencyRange::new(repr.min, repr.max)
            .ok_or_else(|| format!("frequency range {}-{} has min > max", repr.min, repr.max))
    }
}

impl FrequencyRange {
    /// Returns `None` when `min > max`.
    pub fn new(min: u16, max: u16) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// Parse strings like `"2-4 minutes"`, `"4-8 min"` or `"3-5"`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s
            .trim()
            .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
        let (min, max) = digits.split_once('-')?;
        Self::new(min.trim().parse().ok()?, max.trim().parse().ok()?)
    }
}

/// Status of one transit line at the station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStatus {
    pub line_code: String,
    pub frequency_range: FrequencyRange,
    pub service_level: ServiceLevel,
    /// Upstream alert header, kept for logs. Never drawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_text: Option<String>,
}

impl LineStatus {
    pub fn new(
        line_code: impl Into<String>,
        frequency_range: FrequencyRange,
        service_level: ServiceLevel,
    ) -> Self {
        Self {
            line_code: line_code.into(),
            frequency_range,
            service_level,
            alert_text: None,
        }
    }

    /// Compact panel field, e.g. `G:4-8m N`.
    pub fn field_text(&self) -> String {
        format!(
            "{}:{}-{}m {}",
            self.line_code,
            self.frequency_range.min,
            self.frequency_range.max,
            self.service_level.abbrev()
        )
    }
}

/// One snapshot of station status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub station_name: String,
    pub period_label: String,
    /// Display order.
    #[serde(default)]
    pub lines: Vec<LineStatus>,
    pub fetched_at: DateTime<Utc>,
}

/// Why a producer cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Network,
    UpstreamFormat,
    Timeout,
    Unknown,
}

impl FailureReason {
    /// Short label that fits on one panel row.
    pub fn label(self) -> &'static str {
        match self {
            FailureReason::Network => "NETWORK",
            FailureReason::UpstreamFormat => "BAD DATA",
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::Unknown => "UNKNOWN",
        }
    }
}

/// Emitted in place of a [`StatusRecord`] when a cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMarker {
    pub reason: FailureReason,
    pub occurred_at: DateTime<Utc>,
}

impl FailureMarker {
    pub fn new(reason: FailureReason, occurred_at: DateTime<Utc>) -> Self {
        Self { reason, occurred_at }
    }
}

/// A single transport message: either a status or a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Status(StatusRecord),
    Failure(FailureMarker),
}

impl From<StatusRecord> for Message {
    fn from(record: StatusRecord) -> Self {
        Message::Status(record)
    }
}

impl From<FailureMarker> for Message {
    fn from(marker: FailureMarker) -> Self {
        Message::Failure(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text() {
        let line = LineStatus::new("A", FrequencyRange::new(4, 8).unwrap(), ServiceLevel::Normal);
        assert_eq!(line.field_text(), "A:4-8m N");

        let alert = LineStatus::new("O", FrequencyRange::new(2, 4).unwrap(), ServiceLevel::Alert);
        assert_eq!(alert.field_text(), "O:2-4m !");
    }

    #[test]
    fn test_frequency_range_parse() {
        assert_eq!(FrequencyRange::parse("2-4 minutes"), FrequencyRange::new(2, 4));
        assert_eq!(FrequencyRange::parse("8-10 min"), FrequencyRange::new(8, 10));
        assert_eq!(FrequencyRange::parse(" 3 - 5 "), FrequencyRange::new(3, 5));
        assert!(FrequencyRange::parse("5-3 minutes").is_none());
        assert!(FrequencyRange::parse("soon").is_none());
    }

    #[test]
    fn test_inverted_range_rejected_on_deserialize() {
        let json = r#"{"line_code":"G","frequency_range":{"min":9,"max":2},"service_level":"normal"}"#;
        assert!(serde_json::from_str::<LineStatus>(json).is_err());
    }

    #[test]
    fn test_weekend_alias() {
        let json = r#"{"line_code":"G","frequency_range":{"min":4,"max":8},"service_level":"weekend"}"#;
        let line: LineStatus = serde_json::from_str(json).unwrap();
        assert_eq!(line.service_level, ServiceLevel::Reduced);
    }

    #[test]
    fn test_message_is_tagged() {
        let marker = FailureMarker::new(FailureReason::Timeout, Utc::now());
        let json = serde_json::to_value(Message::from(marker)).unwrap();
        assert_eq!(json["kind"], "failure");
        assert_eq!(json["reason"], "timeout");
    }
}
