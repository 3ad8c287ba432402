use crate::geo::distance::{chord_2, chord_2_from_km, distance_km, unit_vector, EARTH_RADIUS_KM};
use crate::types::coordinates::LatLon;
use crate::types::station::Station;
use log::debug;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Batches at least this large are spread over the rayon thread pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

// Chord lengths within this much of a boundary are treated as ties, so no
// station is lost to rounding differences between chord and haversine.
const CHORD_SLACK_RELATIVE: f64 = 1e-9;
const CHORD_SLACK_ABSOLUTE: f64 = 1e-12;

/// A station near a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourResult {
    pub station_id: String,
    /// Great-circle distance from the query point.
    pub distance_km: f64,
    /// Position of the station in the registry slice the index was built from.
    pub index: usize,
}

/// Orders by ascending distance, then ascending station id.
pub(crate) fn compare_neighbours(a: &NeighbourResult, b: &NeighbourResult) -> Ordering {
    OrderedFloat(a.distance_km)
        .cmp(&OrderedFloat(b.distance_km))
        .then_with(|| a.station_id.cmp(&b.station_id))
}

/// A station placed on the unit sphere. Euclidean distance between these
/// points is the chord length, which grows strictly with great-circle
/// distance, so the R-tree's ordering agrees with haversine ordering.
#[derive(Debug, Clone, Copy)]
struct IndexedStation {
    index: usize,
    position: [f64; 3],
}

impl RTreeObject for IndexedStation {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedStation {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        chord_2(self.position, *point)
    }
}

// Helper struct for BinaryHeap ordering
struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station_id: &'a str,
    index: usize,
    chord_2: f64,
}

impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km
            .cmp(&other.distance_km)
            .then_with(|| self.station_id.cmp(other.station_id))
    }
}

fn with_slack(chord_2: f64) -> f64 {
    chord_2 * (1.0 + CHORD_SLACK_RELATIVE) + CHORD_SLACK_ABSOLUTE
}

/// Nearest-neighbour index over a station registry.
///
/// Built once per call over the full registry and reused for every query
/// point of a batch. The index borrows the registry, it never copies or
/// mutates station records.
///
/// # Examples
///
/// ```
/// use stationkit::{LatLon, Station, StationIndex};
///
/// let registry = vec![
///     Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
///     Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
///     Station::new("07341", "Offenbach-Wetterpark", LatLon(50.0899, 8.7862), 119.0),
/// ];
/// let index = StationIndex::new(&registry);
///
/// let batch = index.nearest(&[LatLon(50.0, 8.9), LatLon(51.4, 9.3)], 2);
/// assert_eq!(batch.len(), 2);
/// assert_eq!(batch[0][0].station_id, "02480");
/// assert_eq!(batch[0][1].station_id, "04411");
///
/// assert!(index.within_radius_of(LatLon(50.0, 8.9), 9.0).is_empty());
/// ```
#[derive(Clone)]
pub struct StationIndex<'a> {
    stations: &'a [Station],
    rtree: RTree<IndexedStation>,
    parallel_threshold: usize,
}

impl std::fmt::Debug for StationIndex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationIndex")
            .field("stations", &self.stations.len())
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

impl<'a> StationIndex<'a> {
    pub fn new(stations: &'a [Station]) -> Self {
        let build_start = std::time::Instant::now();
        let entries: Vec<IndexedStation> = stations
            .iter()
            .enumerate()
            .map(|(index, station)| IndexedStation {
                index,
                position: unit_vector(station.location()),
            })
            .collect();
        let rtree = RTree::bulk_load(entries);
        debug!(
            "Indexed {} stations in {:?}",
            stations.len(),
            build_start.elapsed()
        );
        StationIndex {
            stations,
            rtree,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Batches with fewer points than `threshold` are answered on the calling thread.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    pub fn stations(&self) -> &'a [Station] {
        self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// The registry record a result refers to.
    pub fn station(&self, result: &NeighbourResult) -> &'a Station {
        &self.stations[result.index]
    }

    /// For each query point, the `k` closest stations (fewer only if the
    /// registry is smaller), ordered by ascending distance then station id.
    pub fn nearest(&self, points: &[LatLon], k: usize) -> Vec<Vec<NeighbourResult>> {
        self.batch(points, |point| self.nearest_to(point, k))
    }

    /// For each query point, every station within `radius_km` (inclusive),
    /// ordered by ascending distance then station id. May be empty.
    pub fn within_radius(&self, points: &[LatLon], radius_km: f64) -> Vec<Vec<NeighbourResult>> {
        self.batch(points, |point| self.within_radius_of(point, radius_km))
    }

    pub fn nearest_to(&self, point: LatLon, k: usize) -> Vec<NeighbourResult> {
        self.nearest_matching(point, k, |_| true)
    }

    /// The `k` closest stations that satisfy `predicate`.
    ///
    /// Walks the R-tree outwards and keeps the best `k` in a heap. Iteration
    /// stops once the heap is full and the next station is strictly further
    /// away than the current worst candidate, so stations tied with the k-th
    /// distance are all considered before the id tie-break is applied.
    pub fn nearest_matching<F>(&self, point: LatLon, k: usize, predicate: F) -> Vec<NeighbourResult>
    where
        F: Fn(&Station) -> bool,
    {
        let k = k.min(self.stations.len());
        if k == 0 {
            return vec![];
        }
        let query = unit_vector(point);
        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(k + 1);

        for (entry, chord_2) in self.rtree.nearest_neighbor_iter_with_distance_2(&query) {
            if heap.len() == k {
                let worst_chord_2 = heap.peek().map_or(f64::INFINITY, |c| c.chord_2);
                if chord_2 > with_slack(worst_chord_2) {
                    break;
                }
            }

            let station = &self.stations[entry.index];
            if !predicate(station) {
                continue;
            }

            let candidate = StationCandidate {
                distance_km: OrderedFloat(distance_km(point, station.location())),
                station_id: &station.id,
                index: entry.index,
                chord_2,
            };

            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| NeighbourResult {
                station_id: c.station_id.to_string(),
                distance_km: c.distance_km.into_inner(),
                index: c.index,
            })
            .collect()
    }

    pub fn within_radius_of(&self, point: LatLon, radius_km: f64) -> Vec<NeighbourResult> {
        self.within_radius_matching(point, radius_km, |_| true)
    }

    /// Every station within `radius_km` that satisfies `predicate`.
    pub fn within_radius_matching<F>(
        &self,
        point: LatLon,
        radius_km: f64,
        predicate: F,
    ) -> Vec<NeighbourResult>
    where
        F: Fn(&Station) -> bool,
    {
        if !(radius_km >= 0.0) {
            return vec![];
        }
        let query = unit_vector(point);
        let max_chord_2 = with_slack(chord_2_from_km(radius_km));

        let mut found: Vec<NeighbourResult> = self
            .rtree
            .locate_within_distance(query, max_chord_2)
            .filter_map(|entry| {
                let station = &self.stations[entry.index];
                if !predicate(station) {
                    return None;
                }
                let dist_km = distance_km(point, station.location());
                (dist_km <= radius_km).then(|| NeighbourResult {
                    station_id: station.id.clone(),
                    distance_km: dist_km,
                    index: entry.index,
                })
            })
            .collect();

        found.sort_by(compare_neighbours);
        found
    }

    fn batch<F>(&self, points: &[LatLon], query: F) -> Vec<Vec<NeighbourResult>>
    where
        F: Fn(LatLon) -> Vec<NeighbourResult> + Sync + Send,
    {
        if points.len() >= self.parallel_threshold {
            debug!("Answering batch of {} points in parallel", points.len());
            points.par_iter().map(|&point| query(point)).collect()
        } else {
            points.iter().map(|&point| query(point)).collect()
        }
    }

    /// Chord-derived distance, used by tests to check the embedding.
    #[cfg(test)]
    fn chord_distance_km(&self, point: LatLon, index: usize) -> f64 {
        let station = unit_vector(self.stations[index].location());
        crate::geo::distance::km_from_chord_2(chord_2(unit_vector(point), station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::collections::HashSet;

    fn dwd_stations() -> Vec<Station> {
        vec![
            Station::new("04371", "Salzuflen, Bad", LatLon(52.1042, 8.7521), 135.0),
            Station::new("04373", "Salzwedel", LatLon(52.8568, 11.1319), 21.0),
            Station::new("04411", "Schaafheim-Schlierbach", LatLon(49.9195, 8.9671), 155.0),
            Station::new("13904", "Sankt Peter-Ording", LatLon(55.0, 6.3333), 5.0),
            Station::new("13965", "Nordrach", LatLon(48.2639, 8.8134), 322.0),
            Station::new("15207", "Schwalmstadt-Treysa", LatLon(51.2835, 9.359), 216.0),
            Station::new("02480", "Kahl/Main", LatLon(50.0643, 8.993), 108.0),
            Station::new("07341", "Offenbach-Wetterpark", LatLon(50.0899, 8.7862), 119.0),
        ]
    }

    // Deterministic pseudo-random registry without pulling in an rng crate.
    fn synthetic_stations(n: usize) -> Vec<Station> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n)
            .map(|i| {
                let latitude = next() * 180.0 - 90.0;
                let longitude = next() * 360.0 - 180.0;
                Station::new(format!("{i:05}"), format!("Station {i}"), LatLon(latitude, longitude), 0.0)
            })
            .collect()
    }

    fn brute_force(stations: &[Station], point: LatLon) -> Vec<NeighbourResult> {
        let mut all: Vec<NeighbourResult> = stations
            .iter()
            .enumerate()
            .map(|(index, s)| NeighbourResult {
                station_id: s.id.clone(),
                distance_km: distance_km(point, s.location()),
                index,
            })
            .collect();
        all.sort_by(compare_neighbours);
        all
    }

    #[test]
    fn test_nearest_matches_reference_order() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        let results = index.nearest_to(LatLon(50.0, 8.9), 3);
        let ids: Vec<&str> = results.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["02480", "04411", "07341"]);
        assert_abs_diff_eq!(results[0].distance_km, 9.759, epsilon = 1e-3);
        assert_abs_diff_eq!(results[1].distance_km, 10.157, epsilon = 1e-3);
        assert_abs_diff_eq!(results[2].distance_km, 12.883, epsilon = 1e-3);
        assert_eq!(index.station(&results[0]).name, "Kahl/Main");
    }

    #[test]
    fn test_batched_nearest_single_neighbour() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        let batch = index.nearest(&[LatLon(50.0, 8.9), LatLon(51.4, 9.3)], 1);
        assert_eq!(batch[0][0].station_id, "02480");
        assert_eq!(batch[1][0].station_id, "15207");
        assert_abs_diff_eq!(batch[1][0].distance_km, 13.587, epsilon = 1e-3);
        // Same distance as an angle on the unit sphere.
        assert_abs_diff_eq!(batch[1][0].distance_km / EARTH_RADIUS_KM, 0.00213263, epsilon = 1e-7);
    }

    #[test]
    fn test_nearest_length_is_min_of_k_and_registry() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        assert_eq!(index.nearest_to(LatLon(50.0, 8.9), 100).len(), stations.len());
        assert!(index.nearest_to(LatLon(50.0, 8.9), 0).is_empty());
        assert_eq!(index.nearest_to(LatLon(50.0, 8.9), usize::MAX).len(), stations.len());

        let empty: Vec<Station> = vec![];
        let empty_index = StationIndex::new(&empty);
        assert!(empty_index.nearest_to(LatLon(0.0, 0.0), 3).is_empty());
        assert!(empty_index.within_radius_of(LatLon(0.0, 0.0), 1000.0).is_empty());
    }

    #[test]
    fn test_nearest_sorted_unique_subset() {
        let stations = synthetic_stations(2_000);
        let index = StationIndex::new(&stations);
        let ids: HashSet<&str> = stations.iter().map(|s| s.id.as_str()).collect();
        for point in [LatLon(50.0, 8.9), LatLon(-45.0, 170.0), LatLon(89.0, -179.0), LatLon(0.0, 180.0)] {
            let results = index.nearest_to(point, 25);
            assert_eq!(results.len(), 25);
            let unique: HashSet<&str> = results.iter().map(|r| r.station_id.as_str()).collect();
            assert_eq!(unique.len(), results.len());
            assert!(unique.is_subset(&ids));
            for pair in results.windows(2) {
                assert!(pair[0].distance_km <= pair[1].distance_km);
            }
        }
    }

    #[test]
    fn test_nearest_agrees_with_brute_force() {
        let stations = synthetic_stations(1_500);
        let index = StationIndex::new(&stations);
        for point in [LatLon(12.5, -33.0), LatLon(-89.0, 10.0), LatLon(0.0, -180.0)] {
            let expected = brute_force(&stations, point);
            let results = index.nearest_to(point, 10);
            assert_eq!(results, expected[..10].to_vec());
        }
    }

    #[test]
    fn test_within_radius_agrees_with_brute_force() {
        let stations = synthetic_stations(1_500);
        let index = StationIndex::new(&stations);
        for (point, radius) in [
            (LatLon(12.5, -33.0), 800.0),
            (LatLon(-60.0, 179.5), 1_500.0),
            (LatLon(45.0, 7.0), 0.0),
        ] {
            let expected: Vec<NeighbourResult> = brute_force(&stations, point)
                .into_iter()
                .filter(|r| r.distance_km <= radius)
                .collect();
            assert_eq!(index.within_radius_of(point, radius), expected);
        }
    }

    #[test]
    fn test_within_radius_whole_globe_and_empty() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        let everything = index.within_radius_of(LatLon(-50.0, -100.0), std::f64::consts::PI * EARTH_RADIUS_KM);
        assert_eq!(everything.len(), stations.len());
        assert!(index.within_radius_of(LatLon(50.0, 8.9), 9.0).is_empty());
        let kahl_only = index.within_radius_of(LatLon(50.0, 8.9), 10.0);
        assert_eq!(kahl_only.len(), 1);
        assert_eq!(kahl_only[0].station_id, "02480");
        assert!(index.within_radius_of(LatLon(50.0, 8.9), -1.0).is_empty());
        assert!(index.within_radius_of(LatLon(50.0, 8.9), f64::NAN).is_empty());
    }

    #[test]
    fn test_ties_broken_by_station_id() {
        // Four stations at the same distance north, south, east and west of the equator point.
        let stations = vec![
            Station::new("D", "D", LatLon(0.0, 1.0), 0.0),
            Station::new("B", "B", LatLon(1.0, 0.0), 0.0),
            Station::new("C", "C", LatLon(0.0, -1.0), 0.0),
            Station::new("A", "A", LatLon(-1.0, 0.0), 0.0),
            Station::new("Z", "Z", LatLon(5.0, 5.0), 0.0),
        ];
        let index = StationIndex::new(&stations);
        let two = index.nearest_to(LatLon(0.0, 0.0), 2);
        let ids: Vec<&str> = two.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let all_tied = index.within_radius_of(LatLon(0.0, 0.0), 200.0);
        let ids: Vec<&str> = all_tied.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_nearest_matching_skips_filtered_stations() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        let results = index.nearest_matching(LatLon(50.0, 8.9), 2, |s| s.id != "02480");
        let ids: Vec<&str> = results.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["04411", "07341"]);
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let stations = synthetic_stations(1_000);
        let points: Vec<LatLon> = synthetic_stations(200).iter().map(|s| s.location()).collect();
        let sequential = StationIndex::new(&stations).with_parallel_threshold(usize::MAX);
        let parallel = StationIndex::new(&stations).with_parallel_threshold(1);
        assert_eq!(sequential.nearest(&points, 5), parallel.nearest(&points, 5));
        assert_eq!(
            sequential.within_radius(&points, 300.0),
            parallel.within_radius(&points, 300.0)
        );
    }

    #[test]
    fn test_chord_embedding_matches_haversine() {
        let stations = dwd_stations();
        let index = StationIndex::new(&stations);
        let point = LatLon(50.0, 8.9);
        for (i, station) in stations.iter().enumerate() {
            assert_abs_diff_eq!(
                index.chord_distance_km(point, i),
                distance_km(point, station.location()),
                epsilon = 1e-6
            );
        }
    }
}
