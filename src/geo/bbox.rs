use crate::stations::error::SelectionError;
use crate::types::coordinates::LatLon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A latitude/longitude box in decimal degrees, inclusive on every edge.
///
/// When `right < left` the box wraps across the antimeridian, covering
/// `[left, 180]` and `[-180, right]`.
///
/// # Examples
///
/// ```
/// use stationkit::{BoundingBox, LatLon};
///
/// let pacific = BoundingBox::new(170.0, -10.0, -170.0, 10.0).unwrap();
/// assert!(pacific.crosses_antimeridian());
/// assert!(pacific.contains(LatLon(0.0, 179.0)));
/// assert!(!pacific.contains(LatLon(0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Result<Self, SelectionError> {
        BoundingBox {
            left,
            bottom,
            right,
            top,
        }
        .validate()
    }

    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidBoundingBox`] when an edge is out of range
    /// or `bottom` lies above `top`.
    pub fn validate(self) -> Result<Self, SelectionError> {
        for (edge, value) in [("left", self.left), ("right", self.right)] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(SelectionError::InvalidBoundingBox(format!(
                    "{edge} longitude {value} outside [-180, 180]"
                )));
            }
        }
        for (edge, value) in [("bottom", self.bottom), ("top", self.top)] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(SelectionError::InvalidBoundingBox(format!(
                    "{edge} latitude {value} outside [-90, 90]"
                )));
            }
        }
        if self.bottom > self.top {
            return Err(SelectionError::InvalidBoundingBox(format!(
                "bottom {} lies above top {}",
                self.bottom, self.top
            )));
        }
        Ok(self)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.right < self.left
    }

    pub fn contains(&self, point: LatLon) -> bool {
        let latitude_inside = self.bottom <= point.0 && point.0 <= self.top;
        let longitude_inside = if self.crosses_antimeridian() {
            point.1 >= self.left || point.1 <= self.right
        } else {
            self.left <= point.1 && point.1 <= self.right
        };
        latitude_inside && longitude_inside
    }
}

/// Parses `"LEFT BOTTOM RIGHT TOP"`, separated by commas and/or whitespace.
impl FromStr for BoundingBox {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SelectionError::InvalidBoundingBox(format!("'{s}': {e}")))?;
        match values[..] {
            [left, bottom, right, top] => BoundingBox::new(left, bottom, right, top),
            _ => Err(SelectionError::InvalidBoundingBox(format!(
                "'{s}': expected 4 values, got {}",
                values.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_inclusive() {
        let bbox = BoundingBox::new(8.0, 49.0, 9.0, 51.0).unwrap();
        assert!(bbox.contains(LatLon(49.0, 8.0)));
        assert!(bbox.contains(LatLon(51.0, 9.0)));
        assert!(bbox.contains(LatLon(50.0, 8.5)));
        assert!(!bbox.contains(LatLon(51.0001, 8.5)));
        assert!(!bbox.contains(LatLon(50.0, 7.9999)));
    }

    #[test]
    fn test_antimeridian_wraparound() {
        let bbox = BoundingBox::new(170.0, -10.0, -170.0, 10.0).unwrap();
        assert!(bbox.contains(LatLon(0.0, 179.0)));
        assert!(bbox.contains(LatLon(0.0, -175.0)));
        assert!(bbox.contains(LatLon(0.0, 170.0)));
        assert!(bbox.contains(LatLon(0.0, -170.0)));
        assert!(bbox.contains(LatLon(0.0, 180.0)));
        assert!(!bbox.contains(LatLon(0.0, 0.0)));
        assert!(!bbox.contains(LatLon(0.0, 169.9)));
        assert!(!bbox.contains(LatLon(20.0, 179.0)));
    }

    #[test]
    fn test_invalid_boxes() {
        assert!(matches!(
            BoundingBox::new(0.0, 10.0, 1.0, 5.0),
            Err(SelectionError::InvalidBoundingBox(_))
        ));
        assert!(BoundingBox::new(-181.0, 0.0, 1.0, 5.0).is_err());
        assert!(BoundingBox::new(0.0, -91.0, 1.0, 5.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 5.0).is_err());
    }

    #[test]
    fn test_parse() {
        let bbox: BoundingBox = "8.5, 49.5, 9.5, 50.5".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(8.5, 49.5, 9.5, 50.5).unwrap());
        let spaced: BoundingBox = "8.5 49.5 9.5 50.5".parse().unwrap();
        assert_eq!(spaced, bbox);
        assert!("8.5,49.5,9.5".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }
}
