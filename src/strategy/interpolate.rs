use crate::config::EngineConfig;
use crate::series::alignment::AlignedSeries;
use crate::stations::error::SelectionError;
use crate::strategy::{by_distance, Candidate, Provenance, ResolvedPoint, ResolvedSeries, SeriesCombiner};
use bon::bon;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Inverse-distance-weighted blend of the stations around a point.
///
/// For every aligned timestamp only stations with a reading and within
/// `max_distance_km` qualify. If fewer than `min_station_count` qualify the
/// value is missing. A single qualifying station, a co-located station, or
/// the nearest station inside `substitute_within_km` is returned unchanged.
/// Otherwise each reading is weighted by `1 / distance`.
///
/// # Examples
///
/// ```
/// use stationkit::Interpolate;
///
/// let interpolate = Interpolate::builder()
///     .max_distance_km(10.0)
///     .min_station_count(2)
///     .build()
///     .unwrap();
/// assert_eq!(interpolate.max_distance_km(), 10.0);
///
/// assert!(Interpolate::builder().max_distance_km(10.0).min_station_count(0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InterpolateSettings")]
pub struct Interpolate {
    max_distance_km: f64,
    min_station_count: usize,
    substitute_within_km: Option<f64>,
}

// Deserialized settings go through the same validation as the builder.
#[derive(Deserialize)]
struct InterpolateSettings {
    max_distance_km: f64,
    min_station_count: usize,
    substitute_within_km: Option<f64>,
}

impl TryFrom<InterpolateSettings> for Interpolate {
    type Error = SelectionError;

    fn try_from(settings: InterpolateSettings) -> Result<Self, Self::Error> {
        Interpolate::builder()
            .max_distance_km(settings.max_distance_km)
            .min_station_count(settings.min_station_count)
            .maybe_substitute_within_km(settings.substitute_within_km)
            .build()
    }
}

#[bon]
impl Interpolate {
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidSettings`] when `min_station_count` is 0,
    /// or a distance is negative or not finite.
    #[builder]
    pub fn new(
        max_distance_km: f64,
        min_station_count: usize,
        substitute_within_km: Option<f64>,
    ) -> Result<Self, SelectionError> {
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(SelectionError::InvalidSettings(format!(
                "max_distance_km must be finite and >= 0, got {max_distance_km}"
            )));
        }
        if min_station_count < 1 {
            return Err(SelectionError::InvalidSettings(
                "min_station_count must be at least 1".to_string(),
            ));
        }
        if let Some(km) = substitute_within_km {
            if !km.is_finite() || km < 0.0 {
                return Err(SelectionError::InvalidSettings(format!(
                    "substitute_within_km must be finite and >= 0, got {km}"
                )));
            }
        }
        Ok(Self {
            max_distance_km,
            min_station_count,
            substitute_within_km,
        })
    }
}

impl Interpolate {
    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    pub fn min_station_count(&self) -> usize {
        self.min_station_count
    }

    pub fn substitute_within_km(&self) -> Option<f64> {
        self.substitute_within_km
    }

    fn resolve_point(
        &self,
        timestamp: DateTime<Utc>,
        qualifying: &[(&Candidate, f64)],
        epsilon_km: f64,
    ) -> ResolvedPoint {
        if qualifying.is_empty() || qualifying.len() < self.min_station_count {
            return ResolvedPoint::missing(timestamp);
        }

        let colocated: Vec<(&Candidate, f64)> = qualifying
            .iter()
            .copied()
            .filter(|(c, _)| c.distance_km <= epsilon_km)
            .collect();
        if !colocated.is_empty() {
            return blend(timestamp, &colocated, |_| 1.0);
        }

        let (nearest, nearest_value) = qualifying[0];
        let substitute = self
            .substitute_within_km
            .is_some_and(|km| nearest.distance_km <= km);
        if qualifying.len() == 1 || substitute {
            return ResolvedPoint {
                timestamp,
                value: Some(nearest_value),
                provenance: Provenance::Station {
                    station_id: nearest.station_id.clone(),
                    distance_km: nearest.distance_km,
                },
            };
        }

        blend(timestamp, qualifying, |c| 1.0 / c.distance_km.max(epsilon_km))
    }
}

/// Weighted mean of the readings. A single contributor keeps station provenance.
fn blend<W>(timestamp: DateTime<Utc>, readings: &[(&Candidate, f64)], weight: W) -> ResolvedPoint
where
    W: Fn(&Candidate) -> f64,
{
    if let [(only, value)] = readings {
        return ResolvedPoint {
            timestamp,
            value: Some(*value),
            provenance: Provenance::Station {
                station_id: only.station_id.clone(),
                distance_km: only.distance_km,
            },
        };
    }

    let (weighted_sum, weight_sum) = readings
        .iter()
        .fold((0.0, 0.0), |(sum, total), (candidate, value)| {
            let w = weight(*candidate);
            (sum + w * value, total + w)
        });
    let distance_mean =
        readings.iter().map(|(c, _)| c.distance_km).sum::<f64>() / readings.len() as f64;

    ResolvedPoint {
        timestamp,
        value: Some(weighted_sum / weight_sum),
        provenance: Provenance::Blend {
            station_ids: readings.iter().map(|(c, _)| c.station_id.clone()).collect(),
            distance_mean,
        },
    }
}

impl SeriesCombiner for Interpolate {
    fn combine(
        &self,
        aligned: &AlignedSeries,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> ResolvedSeries {
        let parameter = aligned.parameter().clone();
        if !parameter.is_interpolatable() {
            warn!("Parameter {} cannot be interpolated, returning an empty result", parameter);
            return ResolvedSeries::empty(parameter);
        }

        let in_reach: Vec<&Candidate> = by_distance(candidates)
            .into_iter()
            .filter(|c| c.distance_km <= self.max_distance_km)
            .collect();
        if in_reach.is_empty() {
            debug!(
                "No candidate station within {} km, nothing to interpolate",
                self.max_distance_km
            );
        }

        let epsilon_km = config.colocated_epsilon_km;
        let mut qualifying: Vec<(&Candidate, f64)> = Vec::with_capacity(in_reach.len());
        let points = aligned
            .timestamps()
            .iter()
            .map(|&timestamp| {
                qualifying.clear();
                qualifying.extend(in_reach.iter().filter_map(|&c| {
                    aligned
                        .value(&c.station_id, timestamp)
                        .map(|value| (c, value))
                }));
                self.resolve_point(timestamp, &qualifying, epsilon_km)
            })
            .collect();

        ResolvedSeries::new(parameter, points)
    }
}
