//! This module provides the main entry point: a [`StationKit`] ties a station
//! registry to a series provider and answers resolve, interpolate and
//! summarize requests for arbitrary coordinates or registry stations.

use crate::config::EngineConfig;
use crate::error::StationKitError;
use crate::series::alignment::align;
use crate::series::provider::SeriesProvider;
use crate::stations::error::SelectionError;
use crate::stations::registry::Registry;
use crate::stations::selector::{SelectedStation, SelectionCriteria, StationSelector};
use crate::stations::station_index::{NeighbourResult, StationIndex};
use crate::strategy::interpolate::Interpolate;
use crate::strategy::summarize::SummarizeNearest;
use crate::strategy::{Candidate, ResolutionStrategy, ResolvedSeries, SeriesCombiner};
use crate::types::coordinates::LatLon;
use crate::types::series::Parameter;
use crate::types::station::{ActivePeriod, Station};
use crate::types::time_range::TimeRange;
use bon::bon;
use log::{debug, info};

/// Default search radius for [`StationKit::summarize`], in kilometres.
pub const DEFAULT_SUMMARY_DISTANCE_KM: f64 = 50.0;
/// Default number of candidate stations for [`StationKit::summarize`].
pub const DEFAULT_SUMMARY_STATION_LIMIT: usize = 5;

/// The main client struct.
///
/// Holds the registry loaded once at construction, a [`SeriesProvider`] for
/// readings, and the engine-wide [`EngineConfig`]. Every call builds a fresh
/// spatial index over the registry; no state is shared between calls.
///
/// # Examples
///
/// ```rust
/// # use stationkit::{InMemorySeriesProvider, LatLon, Station, StaticRegistry, StationKit, StationKitError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), StationKitError> {
/// let registry = StaticRegistry::new(vec![
///     Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
///     Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
/// ]);
/// let kit = StationKit::from_registry(&registry, InMemorySeriesProvider::new()).await?;
///
/// let nearest = kit.nearest_batch(&[LatLon(50.0, 8.9)], 1)?;
/// assert_eq!(nearest[0][0].station_id, "02480");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StationKit<P> {
    stations: Vec<Station>,
    provider: P,
    config: EngineConfig,
}

#[bon]
impl<P: SeriesProvider> StationKit<P> {
    pub fn new(stations: Vec<Station>, provider: P) -> Self {
        Self {
            stations,
            provider,
            config: EngineConfig::default(),
        }
    }

    /// Loads the station list from `registry` once and keeps it for every later call.
    ///
    /// # Errors
    ///
    /// Returns [`StationKitError::Retrieval`] if the registry cannot be loaded.
    pub async fn from_registry<R>(registry: &R, provider: P) -> Result<Self, StationKitError>
    where
        R: Registry + ?Sized,
    {
        let stations = registry.load().await?;
        info!("StationKit ready with {} stations", stations.len());
        Ok(Self::new(stations, provider))
    }

    /// Replaces the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidSettings`] (wrapped) for an invalid config.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, StationKitError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    fn index(&self) -> StationIndex<'_> {
        StationIndex::new(&self.stations).with_parallel_threshold(self.config.parallel_batch_threshold)
    }

    /// Selects registry stations by one policy.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.criteria(SelectionCriteria)`: **Required.** The selection policy.
    /// * `.active(ActivePeriod)`: Optional. Keep only stations reporting during this period.
    ///
    /// # Errors
    ///
    /// Returns [`StationKitError::Selection`] for invalid criteria, or when a rank
    /// exceeds the number of (active) stations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stationkit::{InMemorySeriesProvider, LatLon, SelectionCriteria, Station, StationKit};
    /// let kit = StationKit::new(
    ///     vec![
    ///         Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
    ///         Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
    ///     ],
    ///     InMemorySeriesProvider::new(),
    /// );
    /// let selected = kit
    ///     .resolve()
    ///     .criteria(SelectionCriteria::by_radius(LatLon(50.0, 8.9), 10.0))
    ///     .call()
    ///     .unwrap();
    /// assert_eq!(selected.len(), 1);
    /// ```
    #[builder]
    pub fn resolve(
        &self,
        criteria: SelectionCriteria,
        active: Option<ActivePeriod>,
    ) -> Result<Vec<SelectedStation>, StationKitError> {
        let selector = StationSelector::new(&self.stations);
        Ok(selector.select(&criteria, active.as_ref())?)
    }

    /// The `k` nearest stations for every point of a batch.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidCoordinates`] (wrapped) if any point is out of range.
    pub fn nearest_batch(
        &self,
        points: &[LatLon],
        k: usize,
    ) -> Result<Vec<Vec<NeighbourResult>>, StationKitError> {
        for point in points {
            point.validate()?;
        }
        Ok(self.index().nearest(points, k))
    }

    /// Interpolates a parameter at a location from the surrounding stations.
    ///
    /// Candidate stations are those within `max_distance_km` that were active
    /// during `range`. For each timestamp the readings are combined by
    /// inverse-distance weighting, see [`Interpolate`].
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The point to interpolate at.
    /// * `.parameter(impl Into<Parameter>)`: **Required.** The observed quantity.
    /// * `.range(TimeRange)`: **Required.** The time span to resolve.
    /// * `.max_distance_km(f64)`: **Required.** Stations further away never contribute.
    /// * `.min_station_count(usize)`: **Required.** Fewer contributing stations leave the value missing.
    /// * `.substitute_within_km(f64)`: Optional. Use the nearest station's value unchanged when it is this close.
    ///
    /// # Returns
    ///
    /// A [`ResolvedSeries`]. It is empty if no station is in reach, and for
    /// parameters that cannot be interpolated.
    ///
    /// # Errors
    ///
    /// Returns [`StationKitError::Selection`] for invalid settings or coordinates,
    /// and [`StationKitError::Retrieval`] if the provider fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use stationkit::*;
    /// # use chrono::{TimeZone, Utc};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), StationKitError> {
    /// let t = Utc.with_ymd_and_hms(2022, 1, 1, 12, 0, 0).unwrap();
    /// let parameter = Parameter::new("temperature_air_mean_200");
    /// let provider: InMemorySeriesProvider = vec![
    ///     StationSeries::new("04411", parameter.clone(), vec![TimeSeriesPoint::new(t, Some(4.0))]),
    ///     StationSeries::new("02480", parameter.clone(), vec![TimeSeriesPoint::new(t, Some(6.0))]),
    /// ]
    /// .into_iter()
    /// .collect();
    /// let kit = StationKit::new(
    ///     vec![
    ///         Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
    ///         Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
    ///     ],
    ///     provider,
    /// );
    ///
    /// let series = kit
    ///     .interpolate()
    ///     .location(LatLon(50.0, 8.9))
    ///     .parameter("temperature_air_mean_200")
    ///     .range(TimeRange::period(t)?)
    ///     .max_distance_km(20.0)
    ///     .min_station_count(2)
    ///     .call()
    ///     .await?;
    /// let value = series.value_at(t).unwrap();
    /// assert!(value > 4.0 && value < 6.0);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn interpolate(
        &self,
        location: LatLon,
        #[builder(into)] parameter: Parameter,
        range: TimeRange,
        max_distance_km: f64,
        min_station_count: usize,
        substitute_within_km: Option<f64>,
    ) -> Result<ResolvedSeries, StationKitError> {
        location.validate()?;
        let strategy = Interpolate::builder()
            .max_distance_km(max_distance_km)
            .min_station_count(min_station_count)
            .maybe_substitute_within_km(substitute_within_km)
            .build()?;

        let active = ActivePeriod::covering(&range);
        let neighbours = self
            .index()
            .within_radius_matching(location, max_distance_km, |s| s.is_active(&active));
        debug!(
            "{} stations within {} km of {} for interpolation",
            neighbours.len(),
            max_distance_km,
            location
        );
        self.combine_neighbours(&neighbours, parameter, range, &strategy.into())
            .await
    }

    /// Takes every value from the nearest station that has one.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The point to summarize at.
    /// * `.parameter(impl Into<Parameter>)`: **Required.** The observed quantity.
    /// * `.range(TimeRange)`: **Required.** The time span to resolve.
    /// * `.max_distance_km(f64)`: Optional. Search radius in kilometres. Defaults to `50.0`.
    /// * `.station_limit(usize)`: Optional. Number of nearest stations to draw from. Defaults to `5`.
    ///
    /// # Errors
    ///
    /// Returns [`StationKitError::Selection`] for invalid coordinates or radius,
    /// and [`StationKitError::Retrieval`] if the provider fails.
    #[builder]
    pub async fn summarize(
        &self,
        location: LatLon,
        #[builder(into)] parameter: Parameter,
        range: TimeRange,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Result<ResolvedSeries, StationKitError> {
        location.validate()?;
        let max_distance_km = max_distance_km.unwrap_or(DEFAULT_SUMMARY_DISTANCE_KM);
        let station_limit = station_limit.unwrap_or(DEFAULT_SUMMARY_STATION_LIMIT);
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(SelectionError::InvalidRadius(max_distance_km).into());
        }

        let active = ActivePeriod::covering(&range);
        let mut neighbours = self
            .index()
            .within_radius_matching(location, max_distance_km, |s| s.is_active(&active));
        neighbours.truncate(station_limit);
        debug!(
            "Summarizing {} from {} stations near {}",
            parameter,
            neighbours.len(),
            location
        );
        self.combine_neighbours(&neighbours, parameter, range, &SummarizeNearest.into())
            .await
    }

    /// Same as [`StationKit::interpolate`], at the coordinates of a registry station.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::StationNotFound`] (wrapped) for an unknown id.
    #[builder]
    pub async fn interpolate_at_station(
        &self,
        station_id: &str,
        #[builder(into)] parameter: Parameter,
        range: TimeRange,
        max_distance_km: f64,
        min_station_count: usize,
        substitute_within_km: Option<f64>,
    ) -> Result<ResolvedSeries, StationKitError> {
        let location = self.station_location(station_id)?;
        self.interpolate()
            .location(location)
            .parameter(parameter)
            .range(range)
            .max_distance_km(max_distance_km)
            .min_station_count(min_station_count)
            .maybe_substitute_within_km(substitute_within_km)
            .call()
            .await
    }

    /// Same as [`StationKit::summarize`], at the coordinates of a registry station.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::StationNotFound`] (wrapped) for an unknown id.
    #[builder]
    pub async fn summarize_at_station(
        &self,
        station_id: &str,
        #[builder(into)] parameter: Parameter,
        range: TimeRange,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Result<ResolvedSeries, StationKitError> {
        let location = self.station_location(station_id)?;
        self.summarize()
            .location(location)
            .parameter(parameter)
            .range(range)
            .maybe_max_distance_km(max_distance_km)
            .maybe_station_limit(station_limit)
            .call()
            .await
    }

    fn station_location(&self, station_id: &str) -> Result<LatLon, SelectionError> {
        self.station(station_id)
            .map(Station::location)
            .ok_or_else(|| SelectionError::StationNotFound(station_id.to_string()))
    }

    async fn combine_neighbours(
        &self,
        neighbours: &[NeighbourResult],
        parameter: Parameter,
        range: TimeRange,
        strategy: &ResolutionStrategy,
    ) -> Result<ResolvedSeries, StationKitError> {
        if neighbours.is_empty() {
            return Ok(ResolvedSeries::empty(parameter));
        }
        let stations: Vec<Station> = neighbours
            .iter()
            .map(|n| self.stations[n.index].clone())
            .collect();
        let aligned = align(&stations, &self.provider, &parameter, &range, &self.config).await?;
        let candidates: Vec<Candidate> = neighbours.iter().map(Candidate::from).collect();
        Ok(strategy.combine(&aligned, &candidates, &self.config))
    }
}
