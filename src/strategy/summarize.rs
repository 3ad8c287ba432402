use crate::config::EngineConfig;
use crate::series::alignment::AlignedSeries;
use crate::strategy::{by_distance, Candidate, Provenance, ResolvedPoint, ResolvedSeries, SeriesCombiner};
use serde::{Deserialize, Serialize};

/// Takes each value from the nearest station that has one.
///
/// Candidates are walked by ascending distance (ties by station id) for every
/// timestamp, so a gap at the nearest station is filled by the next one
/// without any blending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeNearest;

impl SeriesCombiner for SummarizeNearest {
    fn combine(
        &self,
        aligned: &AlignedSeries,
        candidates: &[Candidate],
        _config: &EngineConfig,
    ) -> ResolvedSeries {
        let ordered = by_distance(candidates);
        let points = aligned
            .timestamps()
            .iter()
            .map(|&timestamp| {
                ordered
                    .iter()
                    .find_map(|c| {
                        aligned
                            .value(&c.station_id, timestamp)
                            .map(|value| ResolvedPoint {
                                timestamp,
                                value: Some(value),
                                provenance: Provenance::Station {
                                    station_id: c.station_id.clone(),
                                    distance_km: c.distance_km,
                                },
                            })
                    })
                    .unwrap_or_else(|| ResolvedPoint::missing(timestamp))
            })
            .collect();
        ResolvedSeries::new(aligned.parameter().clone(), points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{aligned, hour, temperature};
    use crate::types::series::Parameter;

    #[test]
    fn test_nearest_station_wins() {
        let aligned = aligned(
            temperature(),
            vec![("A", vec![(0, Some(10.0))]), ("B", vec![(0, Some(20.0))])],
        );
        let candidates = vec![Candidate::new("B", 5.0), Candidate::new("A", 2.0)];
        let result = SummarizeNearest.combine(&aligned, &candidates, &EngineConfig::default());
        assert_eq!(result.value_at(hour(0)), Some(10.0));
        assert_eq!(result.points()[0].provenance.station_ids(), vec!["A"]);
    }

    #[test]
    fn test_gap_filled_by_next_nearest() {
        let aligned = aligned(
            temperature(),
            vec![
                ("A", vec![(0, Some(10.0)), (1, None), (2, Some(12.0))]),
                ("B", vec![(0, Some(20.0)), (1, Some(21.0))]),
            ],
        );
        let candidates = vec![Candidate::new("A", 2.0), Candidate::new("B", 5.0)];
        let result = SummarizeNearest.combine(&aligned, &candidates, &EngineConfig::default());
        assert_eq!(result.value_at(hour(1)), Some(21.0));
        assert_eq!(
            result.point_at(hour(1)).unwrap().provenance,
            Provenance::Station {
                station_id: "B".into(),
                distance_km: 5.0
            }
        );
        assert_eq!(result.value_at(hour(2)), Some(12.0));
    }

    #[test]
    fn test_ties_resolved_by_station_id() {
        let aligned = aligned(
            temperature(),
            vec![("B", vec![(0, Some(2.0))]), ("A", vec![(0, Some(1.0))])],
        );
        let candidates = vec![Candidate::new("B", 3.0), Candidate::new("A", 3.0)];
        let result = SummarizeNearest.combine(&aligned, &candidates, &EngineConfig::default());
        assert_eq!(result.value_at(hour(0)), Some(1.0));
    }

    #[test]
    fn test_no_reading_anywhere_is_missing() {
        let aligned = aligned(
            temperature(),
            vec![("A", vec![(0, None)]), ("B", vec![(0, Some(f64::NAN))])],
        );
        let candidates = vec![Candidate::new("A", 2.0), Candidate::new("B", 5.0)];
        let result = SummarizeNearest.combine(&aligned, &candidates, &EngineConfig::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result.points()[0], ResolvedPoint::missing(hour(0)));
    }

    #[test]
    fn test_circular_parameters_can_be_summarized() {
        let wind = Parameter::circular("wind_direction");
        let aligned = aligned(wind, vec![("A", vec![(0, Some(350.0))])]);
        let result = SummarizeNearest.combine(&aligned, &[Candidate::new("A", 1.0)], &EngineConfig::default());
        assert_eq!(result.value_at(hour(0)), Some(350.0));
    }
}
