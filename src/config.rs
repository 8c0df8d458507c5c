//! Startup configuration.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config panel.toml`)
//! 3. environment variables prefixed `METRO_PANEL_` (`METRO_PANEL_STATION=berri-uqam`)
//! 4. command-line flags
//!
//! ```toml
//! station = "berri-uqam"
//! refresh = "30s"
//! grace_threshold = 3
//! brightness = 60
//! holidays = ["2026-04-03", "2026-05-18"]
//! ```
//!
//! Everything is validated once into a [`PanelConfig`]; any problem is a
//! [`ConfigError`] and the process exits before touching the panel.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::producer::client::DEFAULT_ENDPOINT;
use crate::producer::ProducerTiming;
use crate::render::{Geometry, LayoutOptions, Palette};
use crate::status::{station, Schedule, Station};

const ENV_PREFIX: &str = "METRO_PANEL";
const MAX_SIDE: u32 = 512;

/// Configuration problems. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no station configured; set `station` or METRO_PANEL_STATION (known: {known})")]
    MissingStation { known: String },

    #[error("unknown station `{id}` (known: {known})")]
    UnknownStation { id: String, known: String },

    #[error("invalid duration for `{key}`: `{value}`")]
    Duration { key: &'static str, value: String },

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    #[error("panel {width}x{height} cannot hold three rows of text")]
    Geometry { width: u32, height: u32 },

    #[error("brightness {0} outside 1..=100")]
    Brightness(u8),

    #[error("channel capacity {0} outside 1..=2")]
    Capacity(usize),

    #[error("invalid holiday `{0}`, expected YYYY-MM-DD")]
    Holiday(String),

    #[error("STM credentials missing; set api_key/api_secret or STM_API_KEY/STM_API_SECRET, or use --demo")]
    Credentials,
}

/// Raw settings as read from the layered sources.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub station: Option<String>,
    pub display_name: Option<String>,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub refresh: String,
    pub closed_refresh: String,
    pub fetch_timeout: String,
    pub grace_threshold: u32,
    pub stale_after: Option<String>,
    pub width: u32,
    pub height: u32,
    pub brightness: u8,
    pub channel_capacity: usize,
    pub show_last_success: bool,
    pub holidays: Vec<String>,
    pub shutdown_timeout: String,
    pub demo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            station: None,
            display_name: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_secret: None,
            refresh: "30s".to_string(),
            closed_refresh: "5m".to_string(),
            fetch_timeout: "10s".to_string(),
            grace_threshold: 3,
            stale_after: None,
            width: 64,
            height: 32,
            brightness: 50,
            channel_capacity: 2,
            show_last_success: false,
            holidays: Vec::new(),
            shutdown_timeout: "3s".to_string(),
            demo: false,
        }
    }
}

/// Command-line values that override every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub station: Option<String>,
    pub refresh: Option<String>,
    pub demo: bool,
}

impl Settings {
    /// Read defaults, the optional file, the environment and `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("holidays"),
            )
            .set_override_option("station", overrides.station.clone())?
            .set_override_option("refresh", overrides.refresh.clone())?
            .set_override_option("demo", overrides.demo.then_some(true))?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub station: &'static Station,
    /// Name drawn on the station row.
    pub display_name: String,
    pub endpoint: String,
    /// `(api_key, api_secret)` when both are known.
    pub credentials: Option<(String, String)>,
    pub timing: ProducerTiming,
    pub grace_threshold: u32,
    pub stale_after: Duration,
    pub geometry: Geometry,
    pub brightness: u8,
    pub channel_capacity: usize,
    pub show_last_success: bool,
    pub schedule: Schedule,
    pub shutdown_timeout: Duration,
    pub demo: bool,
}

impl PanelConfig {
    /// Load and validate in one step.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::from_settings(Settings::load(path, overrides)?)
    }

    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let known = || station::known_ids().collect::<Vec<_>>().join(", ");
        let id = settings
            .station
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigError::MissingStation { known: known() })?;
        let station = station::lookup(id).ok_or_else(|| ConfigError::UnknownStation {
            id: id.to_string(),
            known: known(),
        })?;

        let refresh = duration_setting("refresh", &settings.refresh)?;
        let closed_refresh = duration_setting("closed_refresh", &settings.closed_refresh)?;
        let fetch_timeout = duration_setting("fetch_timeout", &settings.fetch_timeout)?;
        let shutdown_timeout = duration_setting("shutdown_timeout", &settings.shutdown_timeout)?;
        let stale_after = match settings.stale_after.as_deref() {
            Some(value) => duration_setting("stale_after", value)?,
            None => refresh * 3,
        };

        if settings.grace_threshold == 0 {
            return Err(ConfigError::Zero("grace_threshold"));
        }

        let geometry = Geometry::new(settings.width, settings.height);
        if geometry.chars_per_line() == 0
            || geometry.text_lines() < 3
            || settings.width > MAX_SIDE
            || settings.height > MAX_SIDE
        {
            return Err(ConfigError::Geometry {
                width: settings.width,
                height: settings.height,
            });
        }

        if !(1..=100).contains(&settings.brightness) {
            return Err(ConfigError::Brightness(settings.brightness));
        }
        if !(1..=2).contains(&settings.channel_capacity) {
            return Err(ConfigError::Capacity(settings.channel_capacity));
        }

        let holidays = settings
            .holidays
            .iter()
            .map(|day| {
                NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d")
                    .map_err(|_| ConfigError::Holiday(day.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let api_key = settings
            .api_key
            .or_else(|| std::env::var("STM_API_KEY").ok())
            .filter(|key| !key.is_empty());
        let api_secret = settings
            .api_secret
            .or_else(|| std::env::var("STM_API_SECRET").ok())
            .filter(|secret| !secret.is_empty());

        Ok(Self {
            station,
            display_name: settings
                .display_name
                .unwrap_or_else(|| station.name.to_string()),
            endpoint: settings.endpoint,
            credentials: api_key.zip(api_secret),
            timing: ProducerTiming {
                refresh,
                closed_refresh,
                fetch_timeout,
            },
            grace_threshold: settings.grace_threshold,
            stale_after,
            geometry,
            brightness: settings.brightness,
            channel_capacity: settings.channel_capacity,
            show_last_success: settings.show_last_success,
            schedule: Schedule::new(holidays),
            shutdown_timeout,
            demo: settings.demo,
        })
    }

    /// Layout policy derived from this configuration.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            geometry: self.geometry,
            brightness: self.brightness,
            stale_after: self.stale_after,
            show_last_success: self.show_last_success,
            title: self.display_name.clone(),
            palette: Palette::standard(),
        }
    }
}

fn duration_setting(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Duration {
        key,
        value: value.to_string(),
    };
    let duration = parse_duration(value).ok_or_else(invalid)?;
    if duration.is_zero() && key != "shutdown_timeout" {
        return Err(ConfigError::Zero(key));
    }
    Ok(duration)
}

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "30s", "500ms", "1.5m" or "1h"
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse().ok()?;
            if !val.is_finite() || val < 0.0 {
                return None;
            }
            return Some(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    None
}
