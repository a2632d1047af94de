//! Report date ranges
//!
//! A [`DateRange`] is the list of calendar days one run re-fetches for a
//! source. It is built by walking a half-open range of day offsets back from
//! an anchor day, which makes it free of duplicates and strictly monotonic.

use std::fmt;

use chrono::{Duration as ChronoDuration, Local, NaiveDate};

use crate::constants::dates::DATE_FORMAT;
use crate::errors::{ConfigError, ConfigResult};

/// Ordered list of days, rendered as `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    days: Vec<NaiveDate>,
}

impl DateRange {
    /// Walk offsets `start, start + step, ...` (stopping before `stop`) and
    /// emit `anchor - offset` for each
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when `step` is zero.
    pub fn walk(anchor: NaiveDate, start: i64, stop: i64, step: i64) -> ConfigResult<Self> {
        if step == 0 {
            return Err(ConfigError::InvalidValue {
                field: "step".to_string(),
                value: "0".to_string(),
                reason: "Date range step must be non-zero".to_string(),
            });
        }

        let mut days = Vec::new();
        let mut offset = start;
        while (step > 0 && offset < stop) || (step < 0 && offset > stop) {
            days.push(anchor - ChronoDuration::days(offset));
            offset += step;
        }

        Ok(Self { days })
    }

    /// The `count` days before `anchor`, oldest first, ending the day before
    pub fn last_days(anchor: NaiveDate, count: u32) -> Self {
        let days = (1..=i64::from(count))
            .rev()
            .map(|offset| anchor - ChronoDuration::days(offset))
            .collect();
        Self { days }
    }

    /// Build from explicit days
    pub fn from_days(days: Vec<NaiveDate>) -> Self {
        Self { days }
    }

    /// Today in local time
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Days in range order
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Days rendered in the API/cache format
    pub fn formatted(&self) -> Vec<String> {
        self.days.iter().map(|day| format_date(*day)).collect()
    }

    /// Earliest day
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.iter().min().copied()
    }

    /// Latest day
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.iter().max().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => write!(
                f,
                "{}..{} ({} days)",
                format_date(first),
                format_date(last),
                self.days.len()
            ),
            _ => write!(f, "<empty>"),
        }
    }
}

/// Render a day as `YYYY-MM-DD`
pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` day
pub fn parse_date(raw: &str) -> ConfigResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| ConfigError::InvalidValue {
        field: "date".to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
