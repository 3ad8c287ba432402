//! Turns a [`SelectionCriteria`] into the matching subset of a station registry.
//!
//! Exactly one policy applies per call. Distance based policies (`ByRank`,
//! `ByRadius`) return stations ordered by ascending distance with ties broken
//! by station id; every other policy keeps registry order.

use crate::geo::bbox::BoundingBox;
use crate::stations::error::SelectionError;
use crate::stations::station_index::{NeighbourResult, StationIndex};
use crate::types::coordinates::LatLon;
use crate::types::station::{ActivePeriod, Station};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionCriteria {
    /// Every station in the registry.
    All,
    /// Stations whose id is in the list. Unknown ids are dropped.
    ByIds(Vec<String>),
    /// Stations whose name contains the text, ignoring case.
    ByName(String),
    /// The `rank` nearest stations to `location`.
    ByRank { location: LatLon, rank: i64 },
    /// Every station within `distance_km` of `location`, inclusive.
    ByRadius { location: LatLon, distance_km: f64 },
    /// Every station inside the box, inclusive on all edges.
    ByBbox(BoundingBox),
}

impl SelectionCriteria {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectionCriteria::ByIds(ids.into_iter().map(Into::into).collect())
    }

    pub fn by_rank(location: LatLon, rank: i64) -> Self {
        SelectionCriteria::ByRank { location, rank }
    }

    pub fn by_radius(location: LatLon, distance_km: f64) -> Self {
        SelectionCriteria::ByRadius {
            location,
            distance_km,
        }
    }

    /// Rejects malformed criteria before any station is looked at.
    ///
    /// # Errors
    ///
    /// * [`SelectionError::InvalidRank`] when a rank is below 1.
    /// * [`SelectionError::InvalidRadius`] when a radius is negative or not finite.
    /// * [`SelectionError::InvalidCoordinates`] for out-of-range query points.
    /// * [`SelectionError::InvalidBoundingBox`] for malformed boxes.
    pub fn validate(&self) -> Result<(), SelectionError> {
        match self {
            SelectionCriteria::All | SelectionCriteria::ByIds(_) | SelectionCriteria::ByName(_) => {
                Ok(())
            }
            SelectionCriteria::ByRank { location, rank } => {
                location.validate()?;
                if *rank < 1 {
                    return Err(SelectionError::InvalidRank(*rank));
                }
                Ok(())
            }
            SelectionCriteria::ByRadius {
                location,
                distance_km,
            } => {
                location.validate()?;
                if !distance_km.is_finite() || *distance_km < 0.0 {
                    return Err(SelectionError::InvalidRadius(*distance_km));
                }
                Ok(())
            }
            SelectionCriteria::ByBbox(bbox) => bbox.validate().map(|_| ()),
        }
    }
}

/// A selected station with its distance to the query point, when the policy has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedStation {
    pub station: Station,
    pub distance_km: Option<f64>,
}

impl SelectedStation {
    fn plain(station: &Station) -> Self {
        Self {
            station: station.clone(),
            distance_km: None,
        }
    }

    fn ranked(station: &Station, neighbour: &NeighbourResult) -> Self {
        Self {
            station: station.clone(),
            distance_km: Some(neighbour.distance_km),
        }
    }
}

/// Applies `criteria` to `registry`, optionally keeping only stations active during `active`.
///
/// # Errors
///
/// Returns a [`SelectionError`] for invalid criteria, and
/// [`SelectionError::RankExceedsRegistry`] when fewer stations than the requested rank
/// remain after date filtering.
///
/// # Examples
///
/// ```
/// use stationkit::{select, LatLon, SelectionCriteria, Station};
///
/// let registry = vec![
///     Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
///     Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
///     Station::new("07341", "Offenbach-Wetterpark", LatLon(50.0899, 8.7862), 119.0),
/// ];
///
/// let nearest = select(&registry, &SelectionCriteria::by_rank(LatLon(50.0, 8.9), 2), None).unwrap();
/// assert_eq!(nearest[0].station.id, "02480");
/// assert_eq!(nearest[1].station.id, "04411");
///
/// let by_name = select(&registry, &SelectionCriteria::ByName("kahl".into()), None).unwrap();
/// assert_eq!(by_name.len(), 1);
///
/// assert!(select(&registry, &SelectionCriteria::by_rank(LatLon(50.0, 8.9), 4), None).is_err());
/// ```
pub fn select(
    registry: &[Station],
    criteria: &SelectionCriteria,
    active: Option<&ActivePeriod>,
) -> Result<Vec<SelectedStation>, SelectionError> {
    criteria.validate()?;
    let is_active = |station: &Station| active.map_or(true, |period| station.is_active(period));

    let selected = match criteria {
        SelectionCriteria::All => registry
            .iter()
            .filter(|&s| is_active(s))
            .map(SelectedStation::plain)
            .collect(),
        SelectionCriteria::ByIds(ids) => {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            let selected: Vec<SelectedStation> = registry
                .iter()
                .filter(|&s| wanted.contains(s.id.as_str()) && is_active(s))
                .map(SelectedStation::plain)
                .collect();
            if selected.len() < wanted.len() {
                debug!(
                    "{} of {} requested station ids matched",
                    selected.len(),
                    wanted.len()
                );
            }
            selected
        }
        SelectionCriteria::ByName(text) => {
            let needle = text.to_lowercase();
            registry
                .iter()
                .filter(|&s| s.name.to_lowercase().contains(&needle) && is_active(s))
                .map(SelectedStation::plain)
                .collect()
        }
        SelectionCriteria::ByRank { location, rank } => {
            let rank = usize::try_from(*rank).map_err(|_| SelectionError::InvalidRank(*rank))?;
            if rank > registry.len() {
                return Err(SelectionError::RankExceedsRegistry {
                    requested: rank,
                    available: registry.iter().filter(|&s| is_active(s)).count(),
                });
            }
            let index = StationIndex::new(registry);
            let neighbours = index.nearest_matching(*location, rank, is_active);
            if neighbours.len() < rank {
                return Err(SelectionError::RankExceedsRegistry {
                    requested: rank,
                    available: neighbours.len(),
                });
            }
            neighbours
                .iter()
                .map(|n| SelectedStation::ranked(index.station(n), n))
                .collect()
        }
        SelectionCriteria::ByRadius {
            location,
            distance_km,
        } => {
            let index = StationIndex::new(registry);
            index
                .within_radius_matching(*location, *distance_km, is_active)
                .iter()
                .map(|n| SelectedStation::ranked(index.station(n), n))
                .collect()
        }
        SelectionCriteria::ByBbox(bbox) => registry
            .iter()
            .filter(|&s| bbox.contains(s.location()) && is_active(s))
            .map(SelectedStation::plain)
            .collect(),
    };
    Ok(selected)
}

/// Reusable selector over a registry. Builds the spatial index once for
/// callers issuing many distance queries against the same stations.
#[derive(Debug, Clone)]
pub struct StationSelector<'a> {
    index: StationIndex<'a>,
}

impl<'a> StationSelector<'a> {
    pub fn new(registry: &'a [Station]) -> Self {
        Self {
            index: StationIndex::new(registry),
        }
    }

    pub fn index(&self) -> &StationIndex<'a> {
        &self.index
    }

    /// Same as [`select`], reusing the prebuilt index for `ByRank` and `ByRadius`.
    pub fn select(
        &self,
        criteria: &SelectionCriteria,
        active: Option<&ActivePeriod>,
    ) -> Result<Vec<SelectedStation>, SelectionError> {
        criteria.validate()?;
        let is_active = |station: &Station| active.map_or(true, |period| station.is_active(period));
        match criteria {
            SelectionCriteria::ByRank { location, rank } => {
                let rank = usize::try_from(*rank).map_err(|_| SelectionError::InvalidRank(*rank))?;
                if rank > self.index.len() {
                    return Err(SelectionError::RankExceedsRegistry {
                        requested: rank,
                        available: self.index.stations().iter().filter(|&s| is_active(s)).count(),
                    });
                }
                let neighbours = self.index.nearest_matching(*location, rank, is_active);
                if neighbours.len() < rank {
                    return Err(SelectionError::RankExceedsRegistry {
                        requested: rank,
                        available: neighbours.len(),
                    });
                }
                Ok(self.with_stations(&neighbours))
            }
            SelectionCriteria::ByRadius {
                location,
                distance_km,
            } => {
                let neighbours = self
                    .index
                    .within_radius_matching(*location, *distance_km, is_active);
                Ok(self.with_stations(&neighbours))
            }
            other => select(self.index.stations(), other, active),
        }
    }

    fn with_stations(&self, neighbours: &[NeighbourResult]) -> Vec<SelectedStation> {
        neighbours
            .iter()
            .map(|n| SelectedStation::ranked(self.index.station(n), n))
            .collect()
    }
}
