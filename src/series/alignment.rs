//! Puts the series of several stations onto one shared timeline.

use crate::config::EngineConfig;
use crate::series::error::RetrievalError;
use crate::series::provider::SeriesProvider;
use crate::types::series::{Parameter, StationSeries};
use crate::types::station::Station;
use crate::types::time_range::TimeRange;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Series of several stations for one parameter, clipped to a common range.
///
/// The timeline is the sorted union of every timestamp any station reported.
/// A station with no reading at a timestamp simply has no value there; empty
/// series are retained so callers can tell "no data" from "not requested".
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    parameter: Parameter,
    range: TimeRange,
    series: BTreeMap<String, StationSeries>,
    timestamps: Vec<DateTime<Utc>>,
    skipped: Vec<String>,
}

impl AlignedSeries {
    /// Aligns series that were already fetched.
    ///
    /// Points outside `range` are dropped. With `config.skip_empty` set, a
    /// station whose missing share exceeds `config.skip_threshold` keeps an
    /// empty series and is listed in [`AlignedSeries::skipped`].
    pub fn from_series(
        parameter: Parameter,
        range: TimeRange,
        series: Vec<StationSeries>,
        config: &EngineConfig,
    ) -> Self {
        let mut by_station = BTreeMap::new();
        let mut skipped = Vec::new();

        for station_series in series {
            let clipped = station_series.clipped(&range);
            let station_id = clipped.station_id().to_string();
            let clipped = if config.skip_empty && clipped.missing_ratio() > config.skip_threshold {
                debug!(
                    "Skipping station {} ({:.0}% missing)",
                    station_id,
                    clipped.missing_ratio() * 100.0
                );
                skipped.push(station_id.clone());
                StationSeries::empty(station_id.clone(), parameter.clone())
            } else {
                clipped
            };
            by_station.insert(station_id, clipped);
        }

        let timestamps: BTreeSet<DateTime<Utc>> = by_station
            .values()
            .flat_map(|s| s.points().iter().map(|p| p.timestamp))
            .collect();

        Self {
            parameter,
            range,
            series: by_station,
            timestamps: timestamps.into_iter().collect(),
            skipped,
        }
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    /// Sorted, unique timestamps across all stations.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn series(&self, station_id: &str) -> Option<&StationSeries> {
        self.series.get(station_id)
    }

    /// The usable reading of a station at a timestamp, if there is one.
    pub fn value(&self, station_id: &str, timestamp: DateTime<Utc>) -> Option<f64> {
        self.series
            .get(station_id)
            .and_then(|s| s.value_at(timestamp))
    }

    /// Stations emptied because too many of their readings were missing.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn station_count(&self) -> usize {
        self.series.len()
    }

    /// True when no station reported anything inside the range.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Fetches the series of every station concurrently and aligns them.
///
/// # Errors
///
/// The first [`RetrievalError`] from the provider aborts the whole alignment.
/// A station that merely has no readings is not an error.
pub async fn align<P>(
    stations: &[Station],
    provider: &P,
    parameter: &Parameter,
    range: &TimeRange,
    config: &EngineConfig,
) -> Result<AlignedSeries, RetrievalError>
where
    P: SeriesProvider + ?Sized,
{
    let fetches = stations
        .iter()
        .map(|station| provider.fetch(&station.id, parameter, range));
    let fetched = try_join_all(fetches).await?;

    let series = stations
        .iter()
        .zip(fetched)
        .map(|(station, series)| {
            if series.station_id() == station.id {
                series
            } else {
                warn!(
                    "Provider returned series for '{}' when asked for '{}'",
                    series.station_id(),
                    station.id
                );
                StationSeries::new(
                    station.id.clone(),
                    parameter.clone(),
                    series.points().to_vec(),
                )
            }
        })
        .collect();

    let aligned = AlignedSeries::from_series(parameter.clone(), *range, series, config);
    debug!(
        "Aligned {} stations over {} timestamps for {}",
        aligned.station_count(),
        aligned.timestamps().len(),
        parameter
    );
    Ok(aligned)
}
