//! Splitting the timed point stream into labeled tracks.
//!
//! Real recordings arrive as many short tracks, a few of them flagged as
//! invalid or stopped. Segment lengths and labels are drawn from the caller's
//! rng so a fixed seed reproduces the exact same split.

use rand::Rng;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use uuid::{Builder, Uuid};

use crate::events::{check_stop, EventSink, StopCheck};
use crate::geo_utils::haversine_distance;
use crate::stamping::TimedPoint;
use crate::Result;

/// Default minimum number of points per segment.
pub const DEFAULT_MIN_SEGMENT_POINTS: usize = 5;

/// Label of a track segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Normal,
    Invalid,
    Stop,
}

impl TrackStatus {
    /// Pick a status from a uniform draw in `[0, 1)`.
    ///
    /// Thresholds are cumulative: 80% normal, 10% invalid, 10% stop.
    pub fn from_draw(u: f64) -> Self {
        if u < 0.8 {
            TrackStatus::Normal
        } else if u < 0.9 {
            TrackStatus::Invalid
        } else {
            TrackStatus::Stop
        }
    }

    /// Wire state code: invalid tracks are "2", everything else "0".
    pub fn tstate(&self) -> &'static str {
        match self {
            TrackStatus::Normal | TrackStatus::Stop => "0",
            TrackStatus::Invalid => "2",
        }
    }
}

/// A contiguous slice of the timed stream with its aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSegment {
    pub id: String,
    pub status: TrackStatus,
    pub point_count: usize,
    /// Sum of per-pair haversine distances over `points`
    pub distance_m: f64,
    /// `ceil((end - start) / 1000)`
    pub duration_s: i64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub points: Vec<TimedPoint>,
}

impl TrackSegment {
    fn from_points<R: Rng>(points: Vec<TimedPoint>, status: TrackStatus, rng: &mut R) -> Self {
        let distance_m: f64 = points
            .windows(2)
            .map(|w| haversine_distance(&w[0].position(), &w[1].position()))
            .sum();
        let start_time_ms = points.first().map_or(0, |p| p.locatetime);
        let end_time_ms = points.last().map_or(0, |p| p.locatetime);
        let elapsed_ms = end_time_ms - start_time_ms;

        Self {
            id: random_uuid(rng).to_string(),
            status,
            point_count: points.len(),
            distance_m,
            duration_s: (elapsed_ms + 999).div_euclid(1000),
            start_time_ms,
            end_time_ms,
            points,
        }
    }

    /// Start time in epoch seconds.
    pub fn start_time_s(&self) -> i64 {
        self.start_time_ms.div_euclid(1000)
    }

    /// End time in epoch seconds.
    pub fn end_time_s(&self) -> i64 {
        self.end_time_ms.div_euclid(1000)
    }
}

impl Serialize for TrackSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrackSegment", 9)?;
        state.serialize_field("counts", &self.point_count)?;
        state.serialize_field("distance", &self.distance_m)?;
        state.serialize_field("duration", &self.duration_s)?;
        state.serialize_field("points", &self.points)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("trid", &self.id)?;
        state.serialize_field("tstate", self.status.tstate())?;
        state.serialize_field("stime", &self.start_time_s())?;
        state.serialize_field("etime", &self.end_time_s())?;
        state.end()
    }
}

/// Version-4 UUID from the rng's bytes, reproducible under a fixed seed.
pub(crate) fn random_uuid<R: Rng>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}

/// Split `points` into segments.
///
/// While points remain: if at most `min_segment_points` are left they form
/// the last segment; otherwise a length is drawn uniformly from
/// `[min, max(min, remaining / 3)]`. A status is then drawn for the segment.
/// The stop check is polled before each segment and aborts without returning
/// any segment.
pub fn split_into_segments<R: Rng>(
    points: &[TimedPoint],
    min_segment_points: usize,
    rng: &mut R,
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<Vec<TrackSegment>> {
    let min_points = min_segment_points.max(1);
    let mut segments = Vec::new();
    let mut start = 0;

    while start < points.len() {
        check_stop(stop, sink)?;

        let remaining = points.len() - start;
        let length = if remaining <= min_points {
            remaining
        } else {
            let upper = min_points.max(remaining / 3);
            rng.gen_range(min_points..=upper)
        };

        let status = TrackStatus::from_draw(rng.gen::<f64>());
        let slice = points[start..start + length].to_vec();
        start += length;

        segments.push(TrackSegment::from_points(slice, status, rng));
    }

    Ok(segments)
}
