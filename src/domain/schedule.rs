//! Positioning-end date window.
//!
//! A market's positioning period may end anywhere from "now" up to a
//! whole number of calendar years ahead. Year addition follows the
//! calendar: Feb 29 maps to Feb 28 in a non-leap target year.

use chrono::{DateTime, Duration, Months, NaiveTime, Utc};
use serde::Serialize;

use super::draft::DraftError;

/// Days between opening the form and the proposed end date.
pub const DEFAULT_END_OFFSET_DAYS: i64 = 10;

/// Hour of day (UTC) every proposed end date is pinned to.
pub const DEFAULT_END_HOUR_UTC: u32 = 12;

/// Calendar years the end date may lie ahead of now.
pub const DEFAULT_WINDOW_YEARS: u32 = 2;

/// Inclusive `[start, end]` range of acceptable end dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, candidate: DateTime<Utc>) -> bool {
        self.start <= candidate && candidate <= self.end
    }
}

/// Computes and enforces the positioning-end window.
#[derive(Debug, Clone)]
pub struct DateRangeGuard {
    end_offset: Duration,
    time_of_day: NaiveTime,
    window_years: u32,
}

impl DateRangeGuard {
    /// Hours past 23 are clamped to 23.
    pub fn new(end_offset_days: i64, end_hour_utc: u32, window_years: u32) -> Self {
        let time_of_day =
            NaiveTime::from_hms_opt(end_hour_utc.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            end_offset: Duration::days(end_offset_days),
            time_of_day,
            window_years,
        }
    }

    /// `now` plus the offset, with the time of day replaced by the fixed hour.
    ///
    /// Rolls forward one day when pinning the hour lands before `now`.
    pub fn default_end_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let pinned = (now + self.end_offset)
            .date_naive()
            .and_time(self.time_of_day)
            .and_utc();
        if pinned < now {
            pinned + Duration::days(1)
        } else {
            pinned
        }
    }

    pub fn valid_range(&self, now: DateTime<Utc>) -> DateWindow {
        let end = now
            .checked_add_months(Months::new(self.window_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        DateWindow { start: now, end }
    }

    pub fn is_valid(&self, candidate: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.valid_range(now).contains(candidate)
    }

    /// Like [`Self::is_valid`] but reports the window on rejection.
    pub fn check(&self, candidate: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DraftError> {
        let window = self.valid_range(now);
        if window.contains(candidate) {
            Ok(())
        } else {
            Err(DraftError::EndDateOutOfRange {
                candidate,
                start: window.start,
                end: window.end,
            })
        }
    }
}

impl Default for DateRangeGuard {
    fn default() -> Self {
        Self::new(
            DEFAULT_END_OFFSET_DAYS,
            DEFAULT_END_HOUR_UTC,
            DEFAULT_WINDOW_YEARS,
        )
    }
}
