//! Polars views of aligned and resolved series, for callers who continue
//! their analysis with DataFrames.

use crate::series::alignment::AlignedSeries;
use crate::strategy::ResolvedSeries;
use crate::types::time_range::TimeRange;
use chrono::{DateTime, Utc};
use polars::prelude::*;

fn datetime_column(timestamps: impl Iterator<Item = DateTime<Utc>>) -> PolarsResult<Series> {
    let millis: Vec<i64> = timestamps.map(|t| t.timestamp_millis()).collect();
    Series::new("datetime".into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

impl ResolvedSeries {
    /// One row per timestamp with columns `datetime`, `value`, `station_ids`
    /// (comma separated, by ascending distance) and `distance_km`.
    ///
    /// # Errors
    ///
    /// Returns a [`PolarsError`] if the frame cannot be assembled.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let datetime = datetime_column(self.points().iter().map(|p| p.timestamp))?;
        let values: Vec<Option<f64>> = self.points().iter().map(|p| p.value).collect();
        let station_ids: Vec<Option<String>> = self
            .points()
            .iter()
            .map(|p| {
                let ids = p.provenance.station_ids();
                (!ids.is_empty()).then(|| ids.join(","))
            })
            .collect();
        let distances: Vec<Option<f64>> = self
            .points()
            .iter()
            .map(|p| p.provenance.distance_km())
            .collect();

        DataFrame::new(vec![
            datetime.into(),
            Series::new("value".into(), values).into(),
            Series::new("station_ids".into(), station_ids).into(),
            Series::new("distance_km".into(), distances).into(),
        ])
    }

    pub fn to_lazy_frame(&self) -> PolarsResult<LazyFrame> {
        Ok(self.to_frame()?.lazy())
    }
}

impl AlignedSeries {
    /// Long format: one row per station and reading, with columns
    /// `station_id`, `datetime`, `value` and `quality`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut station_ids: Vec<&str> = Vec::new();
        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
        let mut values: Vec<Option<f64>> = Vec::new();
        let mut quality: Vec<Option<u32>> = Vec::new();

        for station_id in self.station_ids() {
            let Some(series) = self.series(station_id) else {
                continue;
            };
            for point in series.points() {
                station_ids.push(station_id);
                timestamps.push(point.timestamp);
                values.push(point.reading());
                quality.push(point.quality.map(u32::from));
            }
        }

        DataFrame::new(vec![
            Series::new("station_id".into(), station_ids).into(),
            datetime_column(timestamps.into_iter())?.into(),
            Series::new("value".into(), values).into(),
            Series::new("quality".into(), quality).into(),
        ])
    }
}

/// Row filters for frames produced by [`ResolvedSeries::to_frame`] and
/// [`AlignedSeries::to_frame`].
pub trait SeriesFrameFilterExt {
    /// Keeps rows whose `datetime` lies inside the range (inclusive).
    fn filter_range(self, range: &TimeRange) -> LazyFrame;

    /// Keeps rows with a value.
    fn drop_missing(self) -> LazyFrame;

    /// Keeps rows of one station. Only meaningful for aligned (long format) frames.
    fn filter_station(self, station_id: &str) -> LazyFrame;
}

impl SeriesFrameFilterExt for LazyFrame {
    fn filter_range(self, range: &TimeRange) -> LazyFrame {
        let start = range.start().naive_utc();
        let end = range.end().naive_utc();
        self.filter(
            col("datetime")
                .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                .gt_eq(lit(start))
                .and(
                    col("datetime")
                        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                        .lt_eq(lit(end)),
                ),
        )
    }

    fn drop_missing(self) -> LazyFrame {
        self.filter(col("value").is_not_null())
    }

    fn filter_station(self, station_id: &str) -> LazyFrame {
        self.filter(col("station_id").eq(lit(station_id)))
    }
}
