//! Half-open date windows and the calendar arithmetic used for baselines.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReportError, ReportResult};

/// Date format accepted on the wire and in configuration files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A half-open date interval `[start, end)`.
///
/// Construction goes through [`TimeWindow::new`] (or one of the parsing
/// helpers), which rejects empty and inverted windows, so every value of this
/// type satisfies `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeWindow {
    /// Create a window, rejecting `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        if start >= end {
            return Err(ReportError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a window from an inclusive end date, as dashboards send them.
    pub fn from_inclusive(start: NaiveDate, end_inclusive: NaiveDate) -> ReportResult<Self> {
        let end = end_inclusive
            .succ_opt()
            .ok_or_else(|| ReportError::InvalidDate(end_inclusive.to_string()))?;
        Self::new(start, end)
    }

    /// Parse `YYYY-MM-DD` bounds where the end date is inclusive.
    pub fn parse_inclusive(start: &str, end_inclusive: &str) -> ReportResult<Self> {
        let start = parse_date(start)?;
        let end_inclusive = parse_date(end_inclusive)?;
        Self::from_inclusive(start, end_inclusive)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Last date covered by the window.
    pub fn end_inclusive(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    /// Number of days covered. Always at least one.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// The same window one calendar year earlier.
    ///
    /// Feb 29 maps to Feb 28 when the target year is not a leap year. If both
    /// bounds collapse onto the same day (`[2024-02-28, 2024-02-29)` for
    /// example) the end is pushed one day past the start.
    pub fn year_ago(&self) -> ReportResult<Self> {
        let start = shift_years_back(self.start, 1)?;
        let mut end = shift_years_back(self.end, 1)?;
        if end <= start {
            end = start
                .succ_opt()
                .ok_or_else(|| ReportError::InvalidDate(start.to_string()))?;
        }
        Self::new(start, end)
    }

    /// The equal-length window immediately before this one.
    pub fn previous_period(&self) -> ReportResult<Self> {
        let start = self
            .start
            .checked_sub_signed(Duration::days(self.len_days()))
            .ok_or_else(|| ReportError::InvalidDate(self.start.to_string()))?;
        Self::new(start, self.start)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveDate,
            end: NaiveDate,
        }

        let raw = Raw::deserialize(deserializer)?;
        TimeWindow::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> ReportResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| ReportError::InvalidDate(text.to_string()))
}

/// Move a date back by whole calendar years, clamping Feb 29 to Feb 28.
pub fn shift_years_back(date: NaiveDate, years: i32) -> ReportResult<NaiveDate> {
    let target_year = date.year() - years;
    date.with_year(target_year)
        .or_else(|| NaiveDate::from_ymd_opt(target_year, date.month(), 28))
        .ok_or_else(|| ReportError::InvalidDate(date.to_string()))
}
