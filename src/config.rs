//! Engine-wide settings shared by every query a [`crate::StationKit`] answers.
//!
//! Per-call settings (search radius, minimum station count, ...) are passed to
//! the individual builder methods instead.

use crate::stations::error::SelectionError;
use crate::stations::station_index::DEFAULT_PARALLEL_THRESHOLD;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// # Examples
///
/// ```
/// use stationkit::EngineConfig;
///
/// let config = EngineConfig::builder().skip_empty(true).skip_threshold(0.5).build();
/// assert!(config.validate().is_ok());
///
/// let from_json: EngineConfig = serde_json::from_str(r#"{"skip_empty": true}"#).unwrap();
/// assert_eq!(from_json.skip_threshold, 0.95);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stations closer than this to the query point are treated as co-located
    /// and their value is returned unchanged instead of being weighted.
    #[builder(default = 1e-6)]
    pub colocated_epsilon_km: f64,

    /// Query batches of at least this many points run on the rayon pool.
    #[builder(default = DEFAULT_PARALLEL_THRESHOLD)]
    pub parallel_batch_threshold: usize,

    /// Drop stations whose share of missing readings exceeds `skip_threshold`.
    #[builder(default = false)]
    pub skip_empty: bool,

    /// Missing-reading share above which a station is skipped, in `[0, 1]`.
    #[builder(default = 0.95)]
    pub skip_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::builder().build()
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidSettings`] for a negative or non-finite
    /// epsilon, or a skip threshold outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if !self.colocated_epsilon_km.is_finite() || self.colocated_epsilon_km < 0.0 {
            return Err(SelectionError::InvalidSettings(format!(
                "colocated_epsilon_km must be finite and >= 0, got {}",
                self.colocated_epsilon_km
            )));
        }
        if !(0.0..=1.0).contains(&self.skip_threshold) {
            return Err(SelectionError::InvalidSettings(format!(
                "skip_threshold must be within [0, 1], got {}",
                self.skip_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.colocated_epsilon_km, 1e-6);
        assert_eq!(config.parallel_batch_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert!(!config.skip_empty);
        assert_eq!(config.skip_threshold, 0.95);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EngineConfig::builder().skip_threshold(1.5).build();
        assert!(matches!(config.validate(), Err(SelectionError::InvalidSettings(_))));
        let config = EngineConfig::builder().colocated_epsilon_km(-1.0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = EngineConfig::builder().parallel_batch_threshold(8).build();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
