use crate::series::error::RetrievalError;
use crate::types::series::{Parameter, StationSeries};
use crate::types::time_range::TimeRange;
use async_trait::async_trait;
use std::collections::HashMap;

/// Supplies the readings of one parameter at one station.
///
/// A station without readings is not a failure: return an empty series.
/// Return an error only when the source itself could not be reached or read.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch(
        &self,
        station_id: &str,
        parameter: &Parameter,
        range: &TimeRange,
    ) -> Result<StationSeries, RetrievalError>;
}

/// Serves series held in memory, keyed by station id and parameter name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesProvider {
    series: HashMap<(String, String), StationSeries>,
}

impl InMemorySeriesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: StationSeries) {
        let key = (
            series.station_id().to_string(),
            series.parameter().name().to_string(),
        );
        self.series.insert(key, series);
    }

    pub fn with_series(mut self, series: StationSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<StationSeries> for InMemorySeriesProvider {
    fn from_iter<T: IntoIterator<Item = StationSeries>>(iter: T) -> Self {
        let mut provider = Self::new();
        for series in iter {
            provider.insert(series);
        }
        provider
    }
}

#[async_trait]
impl SeriesProvider for InMemorySeriesProvider {
    async fn fetch(
        &self,
        station_id: &str,
        parameter: &Parameter,
        range: &TimeRange,
    ) -> Result<StationSeries, RetrievalError> {
        let key = (station_id.to_string(), parameter.name().to_string());
        Ok(match self.series.get(&key) {
            Some(series) => series.clone().clipped(range),
            None => StationSeries::empty(station_id, parameter.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::TimeSeriesPoint;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_fetch_clips_and_defaults_to_empty() {
        let parameter = Parameter::new("temperature_air_mean_200");
        let points = (0..24)
            .map(|h| {
                TimeSeriesPoint::new(Utc.with_ymd_and_hms(2022, 1, 1, h, 0, 0).unwrap(), Some(h as f64))
            })
            .collect();
        let provider: InMemorySeriesProvider =
            std::iter::once(StationSeries::new("04411", parameter.clone(), points)).collect();

        let range = TimeRange::from_bounds(
            Utc.with_ymd_and_hms(2022, 1, 1, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 1, 1, 11, 0, 0).unwrap(),
        )
        .unwrap();
        let series = provider.fetch("04411", &parameter, &range).await.unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series.points()[0].value, Some(6.0));

        let unknown = provider.fetch("99999", &parameter, &range).await.unwrap();
        assert!(unknown.is_empty());
        assert_eq!(unknown.station_id(), "99999");

        let other = provider
            .fetch("04411", &Parameter::new("wind_speed"), &range)
            .await
            .unwrap();
        assert!(other.is_empty());
    }
}
