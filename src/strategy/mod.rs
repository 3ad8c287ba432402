//! Strategies that collapse the aligned series of several stations into a
//! single series for one location.
//!
//! A strategy only sees the [`AlignedSeries`] and the candidate stations with
//! their distances, so new blends can be added without touching selection or
//! alignment.

pub mod interpolate;
pub mod summarize;

use crate::config::EngineConfig;
use crate::series::alignment::AlignedSeries;
use crate::stations::station_index::NeighbourResult;
use crate::types::series::Parameter;
use chrono::{DateTime, Utc};
use interpolate::Interpolate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use summarize::SummarizeNearest;

/// A station that may contribute to a result, with its distance to the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub station_id: String,
    pub distance_km: f64,
}

impl Candidate {
    pub fn new(station_id: impl Into<String>, distance_km: f64) -> Self {
        Self {
            station_id: station_id.into(),
            distance_km,
        }
    }
}

impl From<&NeighbourResult> for Candidate {
    fn from(neighbour: &NeighbourResult) -> Self {
        Candidate::new(neighbour.station_id.clone(), neighbour.distance_km)
    }
}

/// Candidates ordered by ascending distance, then station id.
pub(crate) fn by_distance(candidates: &[Candidate]) -> Vec<&Candidate> {
    let mut ordered: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.distance_km.is_finite())
        .collect();
    ordered.sort_by(|a, b| {
        OrderedFloat(a.distance_km)
            .cmp(&OrderedFloat(b.distance_km))
            .then_with(|| a.station_id.cmp(&b.station_id))
    });
    ordered
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Provenance {
    /// Taken unchanged from one station.
    Station { station_id: String, distance_km: f64 },
    /// Combined from several stations, listed by ascending distance.
    Blend {
        station_ids: Vec<String>,
        distance_mean: f64,
    },
    /// No value could be produced.
    Missing,
}

impl Provenance {
    pub fn station_ids(&self) -> Vec<&str> {
        match self {
            Provenance::Station { station_id, .. } => vec![station_id.as_str()],
            Provenance::Blend { station_ids, .. } => station_ids.iter().map(String::as_str).collect(),
            Provenance::Missing => vec![],
        }
    }

    /// Distance of the source station, or mean distance of a blend.
    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Provenance::Station { distance_km, .. } => Some(*distance_km),
            Provenance::Blend { distance_mean, .. } => Some(*distance_mean),
            Provenance::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub provenance: Provenance,
}

impl ResolvedPoint {
    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            value: None,
            provenance: Provenance::Missing,
        }
    }
}

/// One value (or a missing marker) per aligned timestamp, for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSeries {
    parameter: Parameter,
    points: Vec<ResolvedPoint>,
}

impl ResolvedSeries {
    pub fn new(parameter: Parameter, points: Vec<ResolvedPoint>) -> Self {
        Self { parameter, points }
    }

    pub fn empty(parameter: Parameter) -> Self {
        Self::new(parameter, Vec::new())
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn points(&self) -> &[ResolvedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of timestamps for which no value could be produced.
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_none()).count()
    }

    pub fn point_at(&self, timestamp: DateTime<Utc>) -> Option<&ResolvedPoint> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .map(|i| &self.points[i])
    }

    pub fn value_at(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        self.point_at(timestamp).and_then(|p| p.value)
    }
}

/// Combines the aligned series of candidate stations into one resolved series.
pub trait SeriesCombiner {
    fn combine(
        &self,
        aligned: &AlignedSeries,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> ResolvedSeries;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionStrategy {
    Interpolate(Interpolate),
    SummarizeNearest(SummarizeNearest),
}

impl SeriesCombiner for ResolutionStrategy {
    fn combine(
        &self,
        aligned: &AlignedSeries,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> ResolvedSeries {
        match self {
            ResolutionStrategy::Interpolate(strategy) => strategy.combine(aligned, candidates, config),
            ResolutionStrategy::SummarizeNearest(strategy) => {
                strategy.combine(aligned, candidates, config)
            }
        }
    }
}

impl From<Interpolate> for ResolutionStrategy {
    fn from(strategy: Interpolate) -> Self {
        ResolutionStrategy::Interpolate(strategy)
    }
}

impl From<SummarizeNearest> for ResolutionStrategy {
    fn from(strategy: SummarizeNearest) -> Self {
        ResolutionStrategy::SummarizeNearest(strategy)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::series::{StationSeries, TimeSeriesPoint};
    use crate::types::time_range::TimeRange;
    use chrono::TimeZone;

    pub fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, h, 0, 0).unwrap()
    }

    pub fn temperature() -> Parameter {
        Parameter::new("temperature_air_mean_200")
    }

    /// Aligns per-station readings given as `(station, [(hour, value)])`.
    pub fn aligned(parameter: Parameter, readings: Vec<(&str, Vec<(u32, Option<f64>)>)>) -> AlignedSeries {
        let series = readings
            .into_iter()
            .map(|(id, values)| {
                StationSeries::new(
                    id,
                    parameter.clone(),
                    values
                        .iter()
                        .map(|&(h, v)| TimeSeriesPoint::new(hour(h), v))
                        .collect(),
                )
            })
            .collect();
        let range = TimeRange::from_bounds(hour(0), hour(23)).unwrap();
        AlignedSeries::from_series(parameter, range, series, &EngineConfig::default())
    }
}
