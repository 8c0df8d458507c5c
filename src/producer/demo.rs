//! Offline provider that cycles through canned scenes.
//!
//! Used with `--demo` to exercise the panel without upstream credentials:
//! normal, alert, weekend, evening and closed records, then a short outage
//! long enough to push the renderer past its grace threshold.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};

use super::client::{closed_record, normalize, AlertFeed, AlertMessage, InformedEntity};
use super::error::FetchError;
use super::StatusProvider;
use crate::status::{Period, Station, StatusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    Period(Period),
    Alert(Period),
    Outage,
}

const SEQUENCE: &[Scene] = &[
    Scene::Period(Period::AmPeak),
    Scene::Alert(Period::PmPeak),
    Scene::Period(Period::Weekend),
    Scene::Period(Period::Evening),
    Scene::Period(Period::Closed),
    Scene::Outage,
    Scene::Outage,
    Scene::Outage,
    Scene::Outage,
];

#[derive(Debug)]
pub struct DemoProvider {
    station: &'static Station,
    station_name: String,
    cursor: AtomicUsize,
}

impl DemoProvider {
    pub fn new(station: &'static Station, station_name: String) -> Self {
        Self {
            station,
            station_name,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Feed alerting the first line of the station.
    fn alert_feed(&self) -> AlertFeed {
        let route = self.station.lines.first().map(|l| l.route.to_string());
        AlertFeed {
            messages: vec![AlertMessage {
                informed_entities: vec![InformedEntity {
                    route_short_name: route,
                }],
                header_texts: Vec::new(),
                description_texts: Vec::new(),
            }],
        }
    }
}

#[async_trait]
impl StatusProvider for DemoProvider {
    async fn status(&self, now: DateTime<Local>) -> Result<StatusRecord, FetchError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % SEQUENCE.len();
        let now = now.with_timezone(&Utc);
        let empty = AlertFeed { messages: Vec::new() };

        match SEQUENCE[index] {
            Scene::Period(Period::Closed) => Ok(closed_record(&self.station_name, now)),
            Scene::Period(period) => {
                normalize(self.station, &self.station_name, &empty, period, now)
            }
            Scene::Alert(period) => {
                normalize(self.station, &self.station_name, &self.alert_feed(), period, now)
            }
            Scene::Outage => Err(FetchError::Connection("demo outage".to_string())),
        }
    }

    fn description(&self) -> &str {
        "demo"
    }
}
