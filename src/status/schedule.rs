//! Service periods and operating hours.
//!
//! Times before the morning opening belong to the previous service day, so
//! 00:45 on a Saturday is still Friday evening service.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Schedule period used to pick frequencies and the row-2 label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    AmPeak,
    PmPeak,
    OffPeak,
    Evening,
    Weekend,
    Holiday,
    Closed,
}

impl Period {
    /// Label shown on the panel.
    pub fn label(self) -> &'static str {
        match self {
            Period::AmPeak => "AM Peak",
            Period::PmPeak => "PM Peak",
            Period::OffPeak => "Off-peak",
            Period::Evening => "Evening",
            Period::Weekend => "Weekend",
            Period::Holiday => "Holiday",
            Period::Closed => "Closed",
        }
    }

    /// Weekend and holiday periods run the reduced schedule.
    pub fn is_reduced(self) -> bool {
        matches!(self, Period::Weekend | Period::Holiday)
    }
}

/// Fixed-date statutory holidays as (month, day).
const FIXED_HOLIDAYS: &[(u32, u32)] = &[(1, 1), (6, 24), (7, 1), (12, 25)];

/// Minutes since midnight.
const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

const OPENING: u32 = hm(5, 30);
const WEEKDAY_CLOSING: u32 = hm(1, 0);
const WEEKEND_CLOSING: u32 = hm(1, 30);
const AM_PEAK: (u32, u32) = (hm(6, 30), hm(9, 30));
const PM_PEAK: (u32, u32) = (hm(15, 30), hm(18, 30));
const EVENING_START: u32 = hm(21, 0);

fn minute_of_day(at: NaiveDateTime) -> u32 {
    at.hour() * 60 + at.minute()
}

/// Weekday/weekend/holiday schedule table.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    extra_holidays: Vec<NaiveDate>,
}

impl Schedule {
    /// Create a schedule with additional holiday dates on top of the fixed ones.
    pub fn new(extra_holidays: Vec<NaiveDate>) -> Self {
        Self { extra_holidays }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        FIXED_HOLIDAYS.contains(&(date.month(), date.day())) || self.extra_holidays.contains(&date)
    }

    /// The calendar day whose service is running at `at`.
    pub fn service_day(&self, at: NaiveDateTime) -> NaiveDate {
        if minute_of_day(at) < OPENING {
            at.date().checked_sub_days(Days::new(1)).unwrap_or(at.date())
        } else {
            at.date()
        }
    }

    /// Whether trains are running at `at`.
    pub fn is_operating(&self, at: NaiveDateTime) -> bool {
        let time = minute_of_day(at);
        if time >= OPENING {
            return true;
        }
        // The late closing applies to the small hours of Saturday and Sunday
        let closing = if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) {
            WEEKEND_CLOSING
        } else {
            WEEKDAY_CLOSING
        };
        time < closing
    }

    /// The period in effect at `at`, including [`Period::Closed`].
    pub fn period_at(&self, at: NaiveDateTime) -> Period {
        if !self.is_operating(at) {
            return Period::Closed;
        }
        let day = self.service_day(at);
        if self.is_holiday(day) {
            return Period::Holiday;
        }
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            return Period::Weekend;
        }

        let time = minute_of_day(at);
        if time < OPENING || time >= EVENING_START {
            Period::Evening
        } else if time >= AM_PEAK.0 && time < AM_PEAK.1 {
            Period::AmPeak
        } else if time >= PM_PEAK.0 && time < PM_PEAK.1 {
            Period::PmPeak
        } else {
            Period::OffPeak
        }
    }
}
