//! Geographic coordinates
//!
//! Every coordinate the picker stores, compares or emits goes through
//! [`Coordinates::rounded`], which keeps 4 decimal places (about 11 m).

pub mod distance;

use crate::constants::geo::COORD_DECIMALS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Round a single component to [`COORD_DECIMALS`] places
pub fn round_component(value: f64) -> f64 {
    let factor = 10f64.powi(COORD_DECIMALS);
    (value * factor).round() / factor
}

impl Coordinates {
    /// Create new coordinates (unrounded)
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Copy of these coordinates rounded to 4 decimal places
    pub fn rounded(self) -> Self {
        Self {
            lat: round_component(self.lat),
            lng: round_component(self.lng),
        }
    }

    /// Location key used for geocoding deduplication
    ///
    /// Two pairs are the same location iff their keys match.
    pub fn key(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lng)
    }

    /// True when both components are finite and the pair is not (0, 0)
    ///
    /// (0, 0) is what an unset browser form reports, so the map never
    /// initializes there.
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || self.lat < -90.0 || self.lat > 90.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || self.lng < -180.0 || self.lng > 180.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Which component a manual entry targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn bound(self) -> f64 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }
}

/// Parse a manually entered component, returning None for anything that
/// is not a finite number inside the axis range
pub fn parse_component(axis: Axis, text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    if !value.is_finite() || value.abs() > axis.bound() {
        return None;
    }
    Some(round_component(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rounded_keeps_four_places() {
        let c = Coordinates::new(13.736717, 100.523186).rounded();
        assert_relative_eq!(c.lat, 13.7367);
        assert_relative_eq!(c.lng, 100.5232);
    }

    #[test]
    fn test_rounded_over_full_range() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lng = -180.0;
            while lng <= 180.0 {
                let c = Coordinates::new(lat + 0.123456, lng - 0.987654).rounded();
                let scaled_lat = c.lat * 10_000.0;
                let scaled_lng = c.lng * 10_000.0;
                assert!((scaled_lat - scaled_lat.round()).abs() < 1e-6);
                assert!((scaled_lng - scaled_lng.round()).abs() < 1e-6);
                lng += 37.3;
            }
            lat += 17.9;
        }
    }

    #[test]
    fn test_key_matches_after_rounding() {
        let a = Coordinates::new(13.73671, 100.52319);
        let b = Coordinates::new(13.73669, 100.52321);
        assert_eq!(a.rounded().key(), b.rounded().key());
        assert_eq!(a.rounded().key(), "13.7367,100.5232");
    }

    #[test]
    fn test_is_usable() {
        assert!(Coordinates::new(13.7, 100.5).is_usable());
        assert!(Coordinates::new(0.0, 100.5).is_usable());
        assert!(!Coordinates::new(0.0, 0.0).is_usable());
        assert!(!Coordinates::new(f64::NAN, 1.0).is_usable());
    }

    #[test]
    fn test_validate() {
        assert!(Coordinates::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinates::new(90.1, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, -180.5).validate().is_err());
    }

    #[test]
    fn test_parse_component() {
        assert_eq!(parse_component(Axis::Latitude, " 13.756349 "), Some(13.7563));
        assert_eq!(parse_component(Axis::Latitude, "91"), None);
        assert_eq!(parse_component(Axis::Longitude, "-180"), Some(-180.0));
        assert_eq!(parse_component(Axis::Longitude, "abc"), None);
        assert_eq!(parse_component(Axis::Longitude, "inf"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Coordinates::new(13.7563, 100.5018).to_string(), "13.7563, 100.5018");
    }
}
