//! STM service-status client.
//!
//! Queries the i3 `etatservice` endpoint and turns its alert messages into a
//! [`StatusRecord`] for one station.
//!
//! ## Example
//!
//! ```rust,no_run
//! use metro_panel::producer::StmClient;
//!
//! # async fn demo() -> Result<(), metro_panel::producer::FetchError> {
//! let client = StmClient::builder()
//!     .credentials("key", "secret")
//!     .build()?;
//! let feed = client.fetch_alerts().await?;
//! println!("{} alert messages", feed.messages.len());
//! # Ok(()) }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::error::FetchError;
use super::StatusProvider;
use crate::status::{LineStatus, Period, Schedule, ServiceLevel, Station, StatusRecord};

/// Default service-status endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.stm.info/pub/od/i3/v2/messages/etatservice";

/// HTTP client for the STM alert feed.
#[derive(Debug, Clone)]
pub struct StmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
}

impl StmClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> StmClientBuilder {
        StmClientBuilder::default()
    }

    /// Fetch the current alert feed.
    pub async fn fetch_alerts(&self) -> Result<AlertFeed, FetchError> {
        debug!(endpoint = %self.endpoint, "requesting service status");

        let response = self
            .client
            .get(&self.endpoint)
            .header("apiKey", &self.api_key)
            .header("clientSecret", &self.api_secret)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("API returned status {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builder for [`StmClient`].
#[derive(Debug, Default)]
pub struct StmClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    timeout: Option<Duration>,
}

impl StmClientBuilder {
    /// Set the endpoint (default: [`DEFAULT_ENDPOINT`]).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key and client secret.
    pub fn credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StmClient, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(StmClient {
            client,
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: self.api_key.unwrap_or_default(),
            api_secret: self.api_secret.unwrap_or_default(),
        })
    }
}

/// Alert feed returned by the service-status endpoint.
///
/// `messages` is required: a body without it is not a status feed.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeed {
    pub messages: Vec<AlertMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertMessage {
    #[serde(default)]
    pub informed_entities: Vec<InformedEntity>,
    #[serde(default)]
    pub header_texts: Vec<LocalizedText>,
    #[serde(default)]
    pub description_texts: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InformedEntity {
    #[serde(default)]
    pub route_short_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub language: Option<String>,
    pub text: String,
}

/// English text when present, otherwise the first one.
fn preferred_text(texts: &[LocalizedText]) -> Option<&str> {
    texts
        .iter()
        .find(|t| t.language.as_deref() == Some("en"))
        .or_else(|| texts.first())
        .map(|t| t.text.as_str())
}

impl AlertFeed {
    /// First alert naming `route`, as its header (or description) text.
    pub fn alert_for(&self, route: &str) -> Option<String> {
        self.messages
            .iter()
            .find(|m| {
                m.informed_entities
                    .iter()
                    .any(|e| e.route_short_name.as_deref() == Some(route))
            })
            .map(|m| {
                preferred_text(&m.header_texts)
                    .or_else(|| preferred_text(&m.description_texts))
                    .unwrap_or("Service alert")
                    .to_string()
            })
    }
}

/// Build the record for a closed network: period "Closed", no lines.
pub fn closed_record(station_name: &str, now: DateTime<Utc>) -> StatusRecord {
    StatusRecord {
        station_name: station_name.to_string(),
        period_label: Period::Closed.label().to_string(),
        lines: Vec::new(),
        fetched_at: now,
    }
}

/// Combine the station table, the period and the alert feed into a record.
pub fn normalize(
    station: &Station,
    station_name: &str,
    feed: &AlertFeed,
    period: Period,
    now: DateTime<Utc>,
) -> Result<StatusRecord, FetchError> {
    if period == Period::Closed {
        return Ok(closed_record(station_name, now));
    }

    let lines = station
        .lines
        .iter()
        .map(|spec| {
            let range = spec.frequencies.for_period(period).ok_or_else(|| {
                FetchError::Inconsistent(format!(
                    "no {} frequency for {}",
                    period.label(),
                    spec.name
                ))
            })?;
            let alert_text = feed.alert_for(spec.route);
            let level = if alert_text.is_some() {
                ServiceLevel::Alert
            } else if period.is_reduced() {
                ServiceLevel::Reduced
            } else {
                ServiceLevel::Normal
            };
            Ok(LineStatus {
                alert_text,
                ..LineStatus::new(spec.code, range, level)
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(StatusRecord {
        station_name: station_name.to_string(),
        period_label: period.label().to_string(),
        lines,
        fetched_at: now,
    })
}

/// Live provider backed by the STM alert feed.
#[derive(Debug)]
pub struct StmProvider {
    client: StmClient,
    station: &'static Station,
    station_name: String,
    schedule: Schedule,
}

impl StmProvider {
    pub fn new(
        client: StmClient,
        station: &'static Station,
        station_name: String,
        schedule: Schedule,
    ) -> Self {
        Self {
            client,
            station,
            station_name,
            schedule,
        }
    }
}

#[async_trait]
impl StatusProvider for StmProvider {
    async fn status(&self, now: DateTime<Local>) -> Result<StatusRecord, FetchError> {
        let period = self.schedule.period_at(now.naive_local());
        let fetched_at = now.with_timezone(&Utc);
        if period == Period::Closed {
            return Ok(closed_record(&self.station_name, fetched_at));
        }

        let feed = self.client.fetch_alerts().await?;
        normalize(self.station, &self.station_name, &feed, period, fetched_at)
    }

    fn is_closed(&self, now: DateTime<Local>) -> bool {
        !self.schedule.is_operating(now.naive_local())
    }

    fn description(&self) -> &str {
        &self.client.endpoint
    }
}
