//! Great-circle distance between coordinates

use crate::constants::geo::EARTH_RADIUS_METERS;
use crate::coord::Coordinates;
use std::f64::consts::PI;

/// Calculate the distance between two points in meters (Haversine formula)
///
/// # Arguments
/// * `p1` - First point
/// * `p2` - Second point
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat * PI / 180.0;
    let lat2 = p2.lat * PI / 180.0;
    let delta_lat = (p2.lat - p1.lat) * PI / 180.0;
    let delta_lng = (p2.lng - p1.lng) * PI / 180.0;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// True when `point` lies farther than `threshold_meters` from `center`,
/// or when there is no usable center to compare against
pub fn exceeds(center: Option<Coordinates>, point: Coordinates, threshold_meters: f64) -> bool {
    match center {
        Some(center) if center.is_usable() => haversine_distance(center, point) > threshold_meters,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Bangkok to a point one degree north (~111 km)
        let bkk = Coordinates::new(13.7563, 100.5018);
        let north = Coordinates::new(14.7563, 100.5018);

        let distance = haversine_distance(bkk, north);

        assert!(
            (distance - 111_000.0).abs() < 1000.0,
            "Distance {} should be approximately 111000",
            distance
        );
    }

    #[test]
    fn test_zero_distance() {
        let p = Coordinates::new(13.7563, 100.5018);
        assert!(haversine_distance(p, p) < 1e-6);
    }

    #[test]
    fn test_exceeds() {
        let center = Coordinates::new(13.7563, 100.5018);
        let near = Coordinates::new(13.7570, 100.5018); // ~78 m
        let mid = Coordinates::new(13.7600, 100.5018); // ~410 m
        let far = Coordinates::new(13.7700, 100.5018); // ~1.5 km

        assert!(!exceeds(Some(center), near, 100.0));
        assert!(exceeds(Some(center), mid, 100.0));
        assert!(!exceeds(Some(center), mid, 1000.0));
        assert!(exceeds(Some(center), far, 1000.0));
    }

    #[test]
    fn test_exceeds_without_center() {
        let p = Coordinates::new(13.7563, 100.5018);
        assert!(exceeds(None, p, 1000.0));
        assert!(exceeds(Some(Coordinates::new(0.0, 0.0)), p, 1e9));
    }
}
