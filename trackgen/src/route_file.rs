//! Waypoint text format: one `longitude,latitude` pair per line.

use crate::events::{report, EventSink, GenerationEvent};
use crate::{GenerationError, GpsPoint, Result};

/// Parse waypoints from route file text.
///
/// Blank lines are ignored. Lines that are not two comma-separated numbers
/// forming a valid coordinate are skipped with a [`GenerationEvent::SkippedLine`]
/// warning. `source_name` names the route in the error when nothing parses.
pub fn parse_waypoints(
    text: &str,
    source_name: &str,
    sink: &dyn EventSink,
) -> Result<Vec<GpsPoint>> {
    let mut waypoints = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(point) => waypoints.push(point),
            None => report(
                sink,
                GenerationEvent::SkippedLine {
                    line_number: index + 1,
                    content: line.to_string(),
                },
            ),
        }
    }

    if waypoints.is_empty() {
        return Err(GenerationError::EmptyRoute {
            source_name: source_name.to_string(),
        });
    }
    Ok(waypoints)
}

fn parse_line(line: &str) -> Option<GpsPoint> {
    let (lon, lat) = line.split_once(',')?;
    let longitude: f64 = lon.trim().parse().ok()?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let point = GpsPoint::from_lon_lat(longitude, latitude);
    point.is_valid().then_some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingSink, NoopSink};

    #[test]
    fn test_parses_lon_lat_lines() {
        let text = "121.4350,31.0250\n121.4370, 31.0260\n";
        let points = parse_waypoints(text, "user.txt", &NoopSink).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], GpsPoint::new(31.0250, 121.4350));
        assert_eq!(points[1].latitude, 31.0260);
    }

    #[test]
    fn test_blank_lines_ignored_silently() {
        let sink = CollectingSink::new();
        let points = parse_waypoints("\n121.0,31.0\n\n   \n121.1,31.1\n", "r", &sink).unwrap();
        assert_eq!(points.len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_bad_lines_skipped_with_warning() {
        let sink = CollectingSink::new();
        let text = "121.0,31.0\nnot a point\n121.1;31.1\n999,31.0\n121.2,31.2";
        let points = parse_waypoints(text, "r", &sink).unwrap();
        assert_eq!(points.len(), 2);

        let skipped: Vec<usize> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                GenerationEvent::SkippedLine { line_number, .. } => Some(*line_number),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec![2, 3, 4]);
    }

    #[test]
    fn test_nothing_parsed_is_error() {
        let result = parse_waypoints("\n\nfoo\n", "default.txt", &NoopSink);
        match result {
            Err(GenerationError::EmptyRoute { source_name }) => {
                assert_eq!(source_name, "default.txt")
            }
            other => panic!("expected EmptyRoute, got {:?}", other),
        }
    }
}
