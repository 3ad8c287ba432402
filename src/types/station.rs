//! Defines the station record supplied by a registry, and the date-based
//! activity filter that can be applied when selecting stations.

use crate::types::coordinates::LatLon;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single observation station and its metadata.
///
/// Stations are read-only inputs: the core never mutates them. Provider specific
/// capabilities (`state`, `icao_id`) are optional fields rather than separate
/// record types, so a registry fills in whatever its network knows about.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The unique station identifier (e.g., "04411").
    pub id: String,
    /// Human readable station name (e.g., "Schaafheim-Schlierbach").
    pub name: String,
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters.
    pub height: f64,
    /// The state or province, if the network reports one.
    pub state: Option<String>,
    /// International Civil Aviation Organization (ICAO) code, if the station is at an airport.
    pub icao_id: Option<String>,
    /// First day the station reported data, if known.
    pub valid_from: Option<NaiveDate>,
    /// Last day the station reported data, if known. `None` means still active.
    pub valid_to: Option<NaiveDate>,
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: LatLon,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: location.0,
            longitude: location.1,
            height,
            state: None,
            icao_id: None,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_icao_id(mut self, icao_id: impl Into<String>) -> Self {
        self.icao_id = Some(icao_id.into());
        self
    }

    pub fn with_validity(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.valid_from = from;
        self.valid_to = to;
        self
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// Whether the station's validity interval overlaps the requested period.
    ///
    /// Missing bounds are treated as open-ended, so a station without validity
    /// metadata is always considered active.
    pub fn is_active(&self, period: &ActivePeriod) -> bool {
        let Some((start, end)) = period.bounds() else {
            return false;
        };
        self.valid_from.map_or(true, |from| from <= end)
            && self.valid_to.map_or(true, |to| to >= start)
    }
}

/// Restricts a selection to stations that were reporting during a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivePeriod {
    /// The station must have been active on this day.
    Date(NaiveDate),
    /// The station must have been active at some point in this inclusive range.
    Range { start: NaiveDate, end: NaiveDate },
    /// The station must have been active at some point during this year.
    Year(i32),
}

impl ActivePeriod {
    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            ActivePeriod::Date(date) => Some((date, date)),
            ActivePeriod::Range { start, end } => Some((start, end)),
            ActivePeriod::Year(year) => Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            )),
        }
    }

    /// The span of calendar days covered by a [`crate::TimeRange`].
    pub fn covering(range: &crate::TimeRange) -> Self {
        let start = range.start().date_naive();
        let end = range.end().date_naive();
        if start == end {
            ActivePeriod::Date(start)
        } else if start.year() == end.year()
            && (start.month(), start.day()) == (1, 1)
            && (end.month(), end.day()) == (12, 31)
        {
            ActivePeriod::Year(start.year())
        } else {
            ActivePeriod::Range { start, end }
        }
    }
}
