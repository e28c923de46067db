//! The run record handed to the upload collaborator.

use rand::Rng;
use serde::Serialize;

use crate::config::{PaceBounds, ALTERNATE_RUN_ID, SENTINEL_RUN_ID};
use crate::events::{report, EventSink, GenerationEvent, PaceBound};
use crate::segments::{random_uuid, TrackSegment};

/// One run as uploaded: the segments plus run-level figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPayload {
    pub fravg: u32,
    pub id: i64,
    pub sid: String,
    pub signpoints: Vec<serde_json::Value>,
    /// Average pace in whole minutes per kilometer
    pub spavg: u32,
    pub state: String,
    pub tracks: Vec<TrackSegment>,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl RunPayload {
    /// Build the record. The session id is drawn from `rng`.
    pub fn assemble<R: Rng>(
        run_id: i64,
        spavg: u32,
        tracks: Vec<TrackSegment>,
        user_id: &str,
        rng: &mut R,
    ) -> Self {
        Self {
            fravg: 0,
            id: run_id,
            sid: random_uuid(rng).to_string(),
            signpoints: Vec::new(),
            spavg,
            state: "0".to_string(),
            tracks,
            user_id: user_id.to_string(),
        }
    }
}

/// Run id from the rules: missing means the sentinel, and the sentinel is
/// replaced by the alternate id.
pub fn resolve_run_id(rules_id: Option<i64>) -> i64 {
    match rules_id.unwrap_or(SENTINEL_RUN_ID) {
        SENTINEL_RUN_ID => ALTERNATE_RUN_ID,
        id => id,
    }
}

/// Average pace in whole minutes per kilometer, ties rounded to even.
///
/// Zero when either figure is zero.
pub fn average_pace(duration_s: u64, distance_m: f64) -> u32 {
    if duration_s == 0 || distance_m <= 0.0 {
        return 0;
    }
    let pace = duration_s as f64 / (distance_m / 1000.0) / 60.0;
    pace.round_ties_even() as u32
}

/// Pull `pace` (min/km) into `bounds` (s/km).
///
/// A pace faster than the minimum becomes `ceil(min / 60)`, one slower than
/// the maximum becomes `floor(max / 60)`. Nothing is clamped when the run has
/// no distance.
pub fn clamp_pace(pace: u32, bounds: &PaceBounds, distance_m: f64, sink: &dyn EventSink) -> u32 {
    if distance_m <= 0.0 {
        return pace;
    }

    let pace_s = f64::from(pace) * 60.0;
    let (clamped, bound) = if pace_s < bounds.min_s_per_km {
        ((bounds.min_s_per_km / 60.0).ceil() as u32, PaceBound::Min)
    } else if pace_s > bounds.max_s_per_km {
        ((bounds.max_s_per_km / 60.0).floor() as u32, PaceBound::Max)
    } else {
        return pace;
    };

    report(
        sink,
        GenerationEvent::PaceClamped {
            computed: pace,
            clamped,
            bound,
        },
    );
    clamped
}
