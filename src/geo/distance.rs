//! Great-circle distances on a spherical Earth, plus the unit-sphere
//! embedding the station index searches in.

use crate::types::coordinates::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};
use std::f64::consts::PI;

/// Mean Earth radius used by the haversine distance, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance between two points in kilometres.
///
/// The result is symmetric bit-for-bit and `distance_km(a, a) == 0.0`.
///
/// # Examples
///
/// ```
/// use stationkit::{distance_km, LatLon};
///
/// let query = LatLon(50.0, 8.9);
/// let schaafheim = LatLon(49.9195, 8.9671);
/// assert!((distance_km(query, schaafheim) - 10.157).abs() < 1e-3);
/// assert_eq!(distance_km(query, schaafheim), distance_km(schaafheim, query));
/// ```
pub fn distance_km(a: LatLon, b: LatLon) -> f64 {
    // Canonical argument order keeps the floating point evaluation identical both ways.
    let (first, second) = if (a.0, a.1) <= (b.0, b.1) {
        (a, b)
    } else {
        (b, a)
    };
    let km = distance(
        HaversineLocation {
            latitude: first.0,
            longitude: first.1,
        },
        HaversineLocation {
            latitude: second.0,
            longitude: second.1,
        },
        Units::Kilometers,
    );
    if km.is_finite() {
        km.max(0.0)
    } else {
        // Rounding can push the haversine term past 1 for antipodal points.
        km_from_chord_2(chord_2(unit_vector(first), unit_vector(second)))
    }
}

/// Position of a coordinate on the unit sphere.
pub(crate) fn unit_vector(point: LatLon) -> [f64; 3] {
    let latitude = point.0.to_radians();
    let longitude = point.1.to_radians();
    [
        latitude.cos() * longitude.cos(),
        latitude.cos() * longitude.sin(),
        latitude.sin(),
    ]
}

/// Squared Euclidean (chord) distance between two unit vectors.
pub(crate) fn chord_2(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Squared chord length on the unit sphere spanning `km` of great-circle distance.
/// Strictly increasing in `km` up to half the circumference.
pub(crate) fn chord_2_from_km(km: f64) -> f64 {
    let angle = (km / EARTH_RADIUS_KM).clamp(0.0, PI);
    let chord = 2.0 * (angle / 2.0).sin();
    chord * chord
}

/// Inverse of [`chord_2_from_km`].
pub(crate) fn km_from_chord_2(chord_2: f64) -> f64 {
    let half_chord = (chord_2.max(0.0).sqrt() / 2.0).min(1.0);
    2.0 * EARTH_RADIUS_KM * half_chord.asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // Straightforward haversine used as a cross-check.
    fn reference_haversine(a: LatLon, b: LatLon) -> f64 {
        let (lat1, lat2) = (a.0.to_radians(), b.0.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (b.1 - a.1).to_radians();
        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
    }

    fn sample_points() -> Vec<LatLon> {
        vec![
            LatLon(50.0, 8.9),
            LatLon(49.9195, 8.9671),
            LatLon(50.0643, 8.993),
            LatLon(50.0899, 8.7862),
            LatLon(-33.8688, 151.2093),
            LatLon(40.7128, -74.0060),
            LatLon(0.0, 179.9),
            LatLon(0.0, -179.9),
            LatLon(89.9, 0.0),
            LatLon(-90.0, 0.0),
        ]
    }

    #[test]
    fn test_symmetric_and_zero_on_identity() {
        for &a in &sample_points() {
            assert_eq!(distance_km(a, a), 0.0);
            for &b in &sample_points() {
                let d = distance_km(a, b);
                assert!(d >= 0.0);
                assert_eq!(d, distance_km(b, a));
            }
        }
    }

    #[test]
    fn test_agrees_with_reference() {
        for &a in &sample_points() {
            for &b in &sample_points() {
                assert_abs_diff_eq!(distance_km(a, b), reference_haversine(a, b), epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_known_station_distances() {
        let query = LatLon(50.0, 8.9);
        assert_abs_diff_eq!(distance_km(query, LatLon(49.9195, 8.9671)), 10.157, epsilon = 1e-3);
        assert_abs_diff_eq!(distance_km(query, LatLon(50.0643, 8.993)), 9.759, epsilon = 1e-3);
        assert_abs_diff_eq!(distance_km(query, LatLon(50.0899, 8.7862)), 12.883, epsilon = 1e-3);
    }

    #[test]
    fn test_antimeridian_is_short() {
        let d = distance_km(LatLon(0.0, 179.9), LatLon(0.0, -179.9));
        assert!(d < 25.0, "expected ~22 km across the antimeridian, got {d}");
    }

    #[test]
    fn test_chord_conversions_round_trip_and_match_haversine() {
        for km in [0.0, 0.5, 12.0, 1000.0, 19_000.0] {
            assert_abs_diff_eq!(km_from_chord_2(chord_2_from_km(km)), km, epsilon = 1e-6);
        }
        let a = LatLon(50.0, 8.9);
        let b = LatLon(-33.8688, 151.2093);
        let via_chord = km_from_chord_2(chord_2(unit_vector(a), unit_vector(b)));
        assert_abs_diff_eq!(via_chord, distance_km(a, b), epsilon = 1e-6);
    }
}
