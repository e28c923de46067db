//! Geographic utilities for GPS calculations.
//!
//! Distances are great-circle (haversine) on a sphere of radius
//! [`EARTH_RADIUS_M`]. Interpolation is deliberately planar in raw degrees:
//! densified and truncated points must sit exactly where the downstream
//! distance accounting expects them.

use crate::GpsPoint;

/// Mean Earth radius in meters used by every distance in the crate.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters.
///
/// # Example
/// ```
/// use trackgen::GpsPoint;
/// use trackgen::geo_utils::haversine_distance;
///
/// let a = GpsPoint::new(31.0250, 121.4350);
/// assert_eq!(haversine_distance(&a, &a), 0.0);
/// ```
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Total length of a polyline, summed pair by pair. Zero for fewer than two points.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Point at `fraction` of the way from `start` to `end`, interpolating raw
/// latitude and longitude linearly.
#[inline]
pub fn lerp(start: &GpsPoint, end: &GpsPoint, fraction: f64) -> GpsPoint {
    GpsPoint::new(
        start.latitude + fraction * (end.latitude - start.latitude),
        start.longitude + fraction * (end.longitude - start.longitude),
    )
}

/// Round a coordinate to a fixed number of decimal places.
#[inline]
pub fn round_coordinate(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GpsPoint::new(31.0250, 121.4350);
        let b = GpsPoint::new(31.0290, 121.4410);
        assert!(approx_eq(
            haversine_distance(&a, &b),
            haversine_distance(&b, &a),
            1e-9
        ));
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(1.0, 0.0);
        // 2 * pi * 6371000 / 360
        assert!(approx_eq(haversine_distance(&a, &b), 111_194.93, 0.01));
    }

    #[test]
    fn test_polyline_length_short_inputs() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(1.0, 2.0)]), 0.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = GpsPoint::new(31.0, 121.0);
        let b = GpsPoint::new(31.5, 121.2);
        assert_eq!(lerp(&a, &b, 0.0), a);
        assert_eq!(lerp(&a, &b, 1.0), b);
        let mid = lerp(&a, &b, 0.5);
        assert!(approx_eq(mid.latitude, 31.25, 1e-12));
        assert!(approx_eq(mid.longitude, 121.1, 1e-12));
    }

    #[test]
    fn test_round_coordinate() {
        assert_eq!(round_coordinate(121.43408070767154, 6), 121.434081);
        assert_eq!(round_coordinate(31.0232436, 6), 31.023244);
    }
}
