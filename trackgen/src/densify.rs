//! Waypoint interpolation and path densification.
//!
//! A drawn route has a few widely spaced waypoints. Densifying inserts
//! evenly spaced points between every consecutive pair so that neighbouring
//! points are roughly `speed × interval` apart, i.e. one sample per interval.

use crate::geo_utils::{haversine_distance, lerp};
use crate::GpsPoint;

/// Points strictly between `start` and `end`, spaced about `spacing_m` apart.
///
/// With `D` the distance between the endpoints, `n = floor(D / spacing_m)`
/// points are placed at fractions `i / (n + 1)`. Interpolation is linear in
/// raw latitude/longitude, which is accurate enough over the short spans
/// between drawn waypoints.
///
/// Returns an empty vector when the endpoints coincide, when the spacing is
/// not positive, or when the span is shorter than one spacing.
///
/// # Example
/// ```
/// use trackgen::{interpolate_between, GpsPoint};
///
/// let a = GpsPoint::new(31.0000, 121.0);
/// let b = GpsPoint::new(31.0009, 121.0); // ~100 m north
/// assert_eq!(interpolate_between(&a, &b, 30.0).len(), 3);
/// ```
pub fn interpolate_between(start: &GpsPoint, end: &GpsPoint, spacing_m: f64) -> Vec<GpsPoint> {
    let total = haversine_distance(start, end);
    if total == 0.0 || spacing_m <= 0.0 || !spacing_m.is_finite() {
        return Vec::new();
    }

    let count = (total / spacing_m).floor() as usize;
    if count == 0 {
        return Vec::new();
    }

    let denominator = (count + 1) as f64;
    (1..=count)
        .map(|i| lerp(start, end, i as f64 / denominator))
        .collect()
}

/// Densify a waypoint list.
///
/// For every consecutive pair, emits the pair's start, the interpolated
/// points, then the pair's end. Interior waypoints therefore appear twice in
/// a row; the repeat adds no distance and later stages drop it at merge
/// boundaries. Fewer than two waypoints are returned unchanged.
pub fn densify_path(waypoints: &[GpsPoint], spacing_m: f64) -> Vec<GpsPoint> {
    if waypoints.len() < 2 {
        return waypoints.to_vec();
    }

    let mut detailed = Vec::with_capacity(waypoints.len() * 2);
    for pair in waypoints.windows(2) {
        detailed.push(pair[0]);
        detailed.extend(interpolate_between(&pair[0], &pair[1], spacing_m));
        detailed.push(pair[1]);
    }
    detailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::polyline_length;

    fn north_of(origin: &GpsPoint, meters: f64) -> GpsPoint {
        // 111_194.93 m per degree of latitude on the crate's sphere
        GpsPoint::new(origin.latitude + meters / 111_194.926_644_558_7, origin.longitude)
    }

    #[test]
    fn test_identical_points_yield_nothing() {
        let a = GpsPoint::new(31.0, 121.0);
        assert!(interpolate_between(&a, &a, 3.0).is_empty());
    }

    #[test]
    fn test_non_positive_spacing_yields_nothing() {
        let a = GpsPoint::new(31.0, 121.0);
        let b = north_of(&a, 100.0);
        assert!(interpolate_between(&a, &b, 0.0).is_empty());
        assert!(interpolate_between(&a, &b, -5.0).is_empty());
    }

    #[test]
    fn test_span_shorter_than_spacing() {
        let a = GpsPoint::new(31.0, 121.0);
        let b = north_of(&a, 2.0);
        assert!(interpolate_between(&a, &b, 3.0).is_empty());
    }

    #[test]
    fn test_fractions_are_even() {
        let a = GpsPoint::new(31.0, 121.0);
        let b = north_of(&a, 100.0);
        let points = interpolate_between(&a, &b, 3.0);
        // floor(100 / 3) = 33
        assert_eq!(points.len(), 33);
        let step = (b.latitude - a.latitude) / 34.0;
        assert!((points[0].latitude - (a.latitude + step)).abs() < 1e-12);
        assert!((points[32].latitude - (a.latitude + 33.0 * step)).abs() < 1e-12);
    }

    #[test]
    fn test_densify_repeats_interior_waypoints() {
        let a = GpsPoint::new(31.0, 121.0);
        let b = north_of(&a, 10.0);
        let c = north_of(&b, 10.0);
        let detailed = densify_path(&[a, b, c], 4.0);
        // (start + 2 intermediates + end) per pair
        assert_eq!(detailed.len(), 8);
        assert_eq!(detailed[0], a);
        assert_eq!(detailed[3], b);
        assert_eq!(detailed[4], b);
        assert_eq!(detailed[7], c);
    }

    #[test]
    fn test_densify_single_waypoint_unchanged() {
        let a = GpsPoint::new(31.0, 121.0);
        assert_eq!(densify_path(&[a], 3.0), vec![a]);
        assert!(densify_path(&[], 3.0).is_empty());
    }

    #[test]
    fn test_densified_length_matches_pairwise_sum() {
        let waypoints = vec![
            GpsPoint::new(31.0250, 121.4350),
            GpsPoint::new(31.0260, 121.4370),
            GpsPoint::new(31.0245, 121.4390),
            GpsPoint::new(31.0250, 121.4350),
        ];
        let detailed = densify_path(&waypoints, 3.0);

        let independent: f64 = waypoints
            .windows(2)
            .map(|w| {
                let mut piece = vec![w[0]];
                piece.extend(interpolate_between(&w[0], &w[1], 3.0));
                piece.push(w[1]);
                polyline_length(&piece)
            })
            .sum();

        assert!((polyline_length(&detailed) - independent).abs() < 1e-6);
    }
}
