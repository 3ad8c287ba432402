//! Per-station time series as supplied by a [`crate::SeriesProvider`].

use crate::types::time_range::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How values of a parameter may be combined across stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Values on a linear scale (temperature, pressure, precipitation height).
    Linear,
    /// Angular values that wrap around (wind direction). A weighted mean of
    /// 350° and 10° is not 180°, so these are never interpolated.
    Circular,
}

/// An observed quantity, e.g. `temperature_air_mean_200`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Linear,
        }
    }

    pub fn circular(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Circular,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn is_interpolatable(&self) -> bool {
        self.kind == ParameterKind::Linear
    }
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        Parameter::new(name)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A single reading. `value: None` is the missing marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub quality: Option<u8>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            value,
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// The value if it is present and finite. NaN and infinities count as missing.
    pub fn reading(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Readings of one parameter at one station, ordered by timestamp with unique timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    station_id: String,
    parameter: Parameter,
    points: Vec<TimeSeriesPoint>,
}

impl StationSeries {
    /// Builds a series, sorting the points by timestamp. When a timestamp
    /// occurs more than once the last supplied reading wins.
    pub fn new(
        station_id: impl Into<String>,
        parameter: Parameter,
        mut points: Vec<TimeSeriesPoint>,
    ) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let mut unique: Vec<TimeSeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match unique.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => unique.push(point),
            }
        }
        Self {
            station_id: station_id.into(),
            parameter,
            points: unique,
        }
    }

    pub fn empty(station_id: impl Into<String>, parameter: Parameter) -> Self {
        Self {
            station_id: station_id.into(),
            parameter,
            points: Vec::new(),
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The non-missing reading at exactly `timestamp`, if any.
    pub fn value_at(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .and_then(|i| self.points[i].reading())
    }

    /// Drops every point outside `range`.
    pub fn clipped(mut self, range: &TimeRange) -> Self {
        self.points.retain(|p| range.contains(p.timestamp));
        self
    }

    /// Share of points without a usable reading. An empty series counts as fully missing.
    pub fn missing_ratio(&self) -> f64 {
        if self.points.is_empty() {
            return 1.0;
        }
        let missing = self.points.iter().filter(|p| p.reading().is_none()).count();
        missing as f64 / self.points.len() as f64
    }
}
