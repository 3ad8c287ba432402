mod client;
mod config;
mod error;
mod geo;
mod series;
mod stations;
mod strategy;
mod types;

pub use client::*;
pub use config::EngineConfig;
pub use error::StationKitError;

pub use geo::bbox::BoundingBox;
pub use geo::distance::{distance_km, EARTH_RADIUS_KM};

pub use types::coordinates::LatLon;
pub use types::series::{Parameter, ParameterKind, StationSeries, TimeSeriesPoint};
pub use types::station::{ActivePeriod, Station};
pub use types::time_range::TimeRange;
pub use types::traits::any_datetime::AnyDateTime;
pub use types::traits::types::{DateTimeBounds, Month, Year};

pub use stations::error::SelectionError;
pub use stations::registry::{JsonRegistry, Registry, StaticRegistry};
pub use stations::selector::{select, SelectedStation, SelectionCriteria, StationSelector};
pub use stations::station_index::{NeighbourResult, StationIndex, DEFAULT_PARALLEL_THRESHOLD};

pub use series::alignment::{align, AlignedSeries};
pub use series::error::{BoxError, RetrievalError};
pub use series::frame::SeriesFrameFilterExt;
pub use series::provider::{InMemorySeriesProvider, SeriesProvider};

pub use strategy::interpolate::Interpolate;
pub use strategy::summarize::SummarizeNearest;
pub use strategy::{
    Candidate, Provenance, ResolutionStrategy, ResolvedPoint, ResolvedSeries, SeriesCombiner,
};
