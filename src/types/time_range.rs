use crate::stations::error::SelectionError;
use crate::types::traits::any_datetime::AnyDateTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An inclusive `[start, end]` span of UTC instants.
///
/// # Examples
///
/// ```
/// use stationkit::{Month, TimeRange, Year};
///
/// let july = TimeRange::period(Month(2023, 7)).unwrap();
/// let same = TimeRange::new(Month(2023, 7), Month(2023, 7)).unwrap();
/// assert_eq!(july, same);
///
/// let span: TimeRange = "2020-06-15T12/2020-06-16T12".parse().unwrap();
/// assert!(span.start() < span.end());
///
/// assert!(TimeRange::new(Year(2021), Year(2020)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Spans from the first instant of `start` to the last instant of `end`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidTimeRange`] if either bound cannot be
    /// resolved or `start` falls after `end`.
    pub fn new(start: impl AnyDateTime, end: impl AnyDateTime) -> Result<Self, SelectionError> {
        let start = start
            .datetime_bounds()
            .ok_or_else(|| SelectionError::InvalidTimeRange("unresolvable start".to_string()))?
            .start;
        let end = end
            .datetime_bounds()
            .ok_or_else(|| SelectionError::InvalidTimeRange("unresolvable end".to_string()))?
            .end;
        Self::from_bounds(start, end)
    }

    /// The full extent of a single period (a day, month, year or instant).
    pub fn period(period: impl AnyDateTime) -> Result<Self, SelectionError> {
        let bounds = period
            .datetime_bounds()
            .ok_or_else(|| SelectionError::InvalidTimeRange("unresolvable period".to_string()))?;
        Self::from_bounds(bounds.start, bounds.end)
    }

    pub fn from_bounds(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SelectionError> {
        if start > end {
            return Err(SelectionError::InvalidTimeRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parses `"START/END"` or a single period such as `"2020-05"`.
impl FromStr for TimeRange {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((start, end)) => TimeRange::new(start, end),
            None => TimeRange::period(s),
        }
    }
}
