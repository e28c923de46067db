//! Constant-speed timestamps for the matched point sequence.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::events::{check_stop, report, EventSink, GenerationEvent, StopCheck};
use crate::geo_utils::{haversine_distance, round_coordinate};
use crate::{GpsPoint, Result};

/// Decimal places kept for recorded coordinates.
pub const TRACK_POINT_DECIMAL_PLACES: u32 = 6;

/// A recorded sample: rounded position plus the time it was "observed".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds
    pub locatetime: i64,
    pub step: u32,
}

impl TimedPoint {
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// `"longitude,latitude"` at the recorded precision.
    pub fn location(&self) -> String {
        let places = TRACK_POINT_DECIMAL_PLACES as usize;
        format!("{:.*},{:.*}", places, self.longitude, places, self.latitude)
    }
}

#[derive(serde::Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl Serialize for TimedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimedPoint", 4)?;
        state.serialize_field(
            "latLng",
            &LatLng {
                latitude: self.latitude,
                longitude: self.longitude,
            },
        )?;
        state.serialize_field("location", &self.location())?;
        state.serialize_field("step", &self.step)?;
        state.serialize_field("locatetime", &self.locatetime)?;
        state.end()
    }
}

/// Timestamp every point as if moving at `speed_mps` from `base_start_ms`.
///
/// Distance is accumulated over the unrounded input; point `i` gets
/// `base_start_ms + floor(s_i / speed × 1000)`, so the first point gets
/// `base_start_ms` exactly. A non-positive speed pins every point to the
/// start time. The stop check is polled once per point.
pub fn stamp_points(
    points: &[GpsPoint],
    speed_mps: f64,
    base_start_ms: i64,
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<Vec<TimedPoint>> {
    let moving = speed_mps > 0.0 && speed_mps.is_finite();
    if !moving {
        report(
            sink,
            GenerationEvent::DegenerateGeometry {
                reason: format!("speed {} m/s is not positive; timestamps pinned", speed_mps),
            },
        );
    }

    let mut stamped = Vec::with_capacity(points.len());
    let mut travelled = 0.0;
    let mut previous: Option<&GpsPoint> = None;

    for point in points {
        check_stop(stop, sink)?;

        if let Some(prev) = previous {
            travelled += haversine_distance(prev, point);
        }
        previous = Some(point);

        let locatetime = if moving {
            base_start_ms + (travelled / speed_mps * 1000.0).floor() as i64
        } else {
            base_start_ms
        };

        stamped.push(TimedPoint {
            latitude: round_coordinate(point.latitude, TRACK_POINT_DECIMAL_PLACES),
            longitude: round_coordinate(point.longitude, TRACK_POINT_DECIMAL_PLACES),
            locatetime,
            step: 0,
        });
    }

    Ok(stamped)
}
