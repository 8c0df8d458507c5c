//! Built-in station catalog.

use super::record::FrequencyRange;
use super::schedule::Period;

/// Expected waits for one line, per schedule period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyTable {
    pub am_peak: FrequencyRange,
    pub pm_peak: FrequencyRange,
    pub off_peak: FrequencyRange,
    pub evening: FrequencyRange,
    pub weekend: FrequencyRange,
}

impl FrequencyTable {
    /// `None` while the network is closed.
    pub fn for_period(&self, period: Period) -> Option<FrequencyRange> {
        match period {
            Period::AmPeak => Some(self.am_peak),
            Period::PmPeak => Some(self.pm_peak),
            Period::OffPeak => Some(self.off_peak),
            Period::Evening => Some(self.evening),
            Period::Weekend | Period::Holiday => Some(self.weekend),
            Period::Closed => None,
        }
    }
}

/// A line serving a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpec {
    /// Upstream route number, matched against alert entities.
    pub route: &'static str,
    /// Short code drawn on the panel.
    pub code: &'static str,
    pub name: &'static str,
    pub frequencies: FrequencyTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub id: &'static str,
    pub name: &'static str,
    /// Display order.
    pub lines: &'static [LineSpec],
}

const fn range(min: u16, max: u16) -> FrequencyRange {
    FrequencyRange { min, max }
}

const STANDARD_FREQUENCIES: FrequencyTable = FrequencyTable {
    am_peak: range(2, 4),
    pm_peak: range(2, 4),
    off_peak: range(3, 5),
    evening: range(8, 10),
    weekend: range(4, 8),
};

const GREEN: LineSpec = LineSpec {
    route: "1",
    code: "G",
    name: "Green Line",
    frequencies: STANDARD_FREQUENCIES,
};

const ORANGE: LineSpec = LineSpec {
    route: "2",
    code: "O",
    name: "Orange Line",
    frequencies: STANDARD_FREQUENCIES,
};

static STATIONS: &[Station] = &[
    Station {
        id: "berri-uqam",
        name: "Berri-UQAM",
        lines: &[GREEN, ORANGE],
    },
    Station {
        id: "lionel-groulx",
        name: "Lionel-Groulx",
        lines: &[GREEN, ORANGE],
    },
];

fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find a station by identifier, ignoring case and punctuation.
pub fn lookup(id: &str) -> Option<&'static Station> {
    let wanted = normalize_id(id);
    if wanted.is_empty() {
        return None;
    }
    STATIONS.iter().find(|s| normalize_id(s.id) == wanted)
}

/// Identifiers of all built-in stations.
pub fn known_ids() -> impl Iterator<Item = &'static str> {
    STATIONS.iter().map(|s| s.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case_and_punctuation() {
        assert_eq!(lookup("BERRI-UQAM").map(|s| s.name), Some("Berri-UQAM"));
        assert_eq!(lookup("berri_uqam").map(|s| s.name), Some("Berri-UQAM"));
        assert!(lookup("atwater").is_none());
        assert!(lookup("--").is_none());
    }

    #[test]
    fn test_frequencies_per_period() {
        let station = lookup("berri-uqam").unwrap();
        let green = &station.lines[0];
        assert_eq!(green.frequencies.for_period(Period::Weekend), FrequencyRange::new(4, 8));
        assert_eq!(green.frequencies.for_period(Period::Holiday), FrequencyRange::new(4, 8));
        assert_eq!(green.frequencies.for_period(Period::Evening), FrequencyRange::new(8, 10));
        assert!(green.frequencies.for_period(Period::Closed).is_none());
    }
}
