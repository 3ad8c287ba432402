use thiserror::Error;

/// Malformed or contradictory selection criteria. Surfaced immediately, never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Rank must be at least 1, got {0}")]
    InvalidRank(i64),

    #[error("Requested the {requested} nearest stations but only {available} are available")]
    RankExceedsRegistry { requested: usize, available: usize },

    #[error("Coordinates ({latitude}, {longitude}) are outside the valid range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Failed to parse coordinates from '{0}', expected 'LATITUDE,LONGITUDE'")]
    CoordinateParse(String),

    #[error("Radius must be a finite, non-negative number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("No station found for id '{0}'")]
    StationNotFound(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}
