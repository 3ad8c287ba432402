use crate::stations::error::SelectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a geographical coordinate using latitude and longitude in decimal degrees.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use stationkit::LatLon;
///
/// let schaafheim = LatLon(49.9195, 8.9671);
/// assert_eq!(schaafheim.latitude(), 49.9195);
/// assert_eq!(schaafheim.longitude(), 8.9671);
///
/// let parsed: LatLon = "49.9195,8.9671".parse().unwrap();
/// assert_eq!(parsed, schaafheim);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(self) -> f64 {
        self.0
    }

    pub fn longitude(self) -> f64 {
        self.1
    }

    /// Checks that latitude lies in `[-90, 90]` and longitude in `[-180, 180]`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidCoordinates`] for out-of-range or non-finite values.
    pub fn validate(self) -> Result<Self, SelectionError> {
        let latitude_ok = (-90.0..=90.0).contains(&self.0);
        let longitude_ok = (-180.0..=180.0).contains(&self.1);
        if latitude_ok && longitude_ok {
            Ok(self)
        } else {
            Err(SelectionError::InvalidCoordinates {
                latitude: self.0,
                longitude: self.1,
            })
        }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// Parses `"LATITUDE,LONGITUDE"` and validates the result.
impl FromStr for LatLon {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || SelectionError::CoordinateParse(s.to_string());
        let (latitude, longitude) = s.split_once(',').ok_or_else(parse_error)?;
        let latitude = latitude.trim().parse::<f64>().map_err(|_| parse_error())?;
        let longitude = longitude.trim().parse::<f64>().map_err(|_| parse_error())?;
        LatLon(latitude, longitude).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(LatLon(90.0, 180.0).validate().is_ok());
        assert!(LatLon(-90.0, -180.0).validate().is_ok());
        assert!(matches!(
            LatLon(90.1, 0.0).validate(),
            Err(SelectionError::InvalidCoordinates { .. })
        ));
        assert!(LatLon(0.0, -180.5).validate().is_err());
        assert!(LatLon(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(" 50.0 , 8.9 ".parse::<LatLon>(), Ok(LatLon(50.0, 8.9)));
        assert_eq!(
            "50.0".parse::<LatLon>(),
            Err(SelectionError::CoordinateParse("50.0".to_string()))
        );
        assert!(matches!(
            "95.0,8.9".parse::<LatLon>(),
            Err(SelectionError::InvalidCoordinates { .. })
        ));
    }
}
