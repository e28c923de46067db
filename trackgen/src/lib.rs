//! # Trackgen
//!
//! Synthetic GPS run tracks from a handful of hand-drawn waypoints.
//!
//! This library provides:
//! - Waypoint densification at a speed-derived spacing
//! - Length matching to a target distance (truncate, round trip, loop repeat)
//! - Constant-speed timestamping of every point
//! - Segmentation into randomly sized, randomly labeled tracks
//! - Assembly of the run payload with a clamped average pace
//!
//! ## Features
//!
//! - **`parallel`** - Generate the runs of a multi-day batch in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use trackgen::{generate_run, GpsPoint, NeverStop, NoopSink, RunConfig, RunRules};
//!
//! let waypoints = vec![
//!     GpsPoint::new(31.0250, 121.4350),
//!     GpsPoint::new(31.0260, 121.4370),
//!     GpsPoint::new(31.0245, 121.4390),
//! ];
//!
//! let config = RunConfig {
//!     target_distance_km: 1.0,
//!     start_time_ms: Some(1_700_000_000_000),
//!     ..RunConfig::default()
//! };
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let rules = RunRules::default();
//! let run = generate_run(&waypoints, &config, &rules, &mut rng, &NoopSink, &NeverStop).unwrap();
//! println!("{:.0} m in {} s", run.distance_m, run.duration_s);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{GenerationError, OptionExt, Result};

// Leveled events and cooperative cancellation
pub mod events;
pub use events::{
    CollectingSink, EventLevel, EventSink, GenerationEvent, NeverStop, NoopSink, PaceBound,
    StopCheck,
};

// Geographic utilities (haversine, polyline length, planar interpolation)
pub mod geo_utils;

// Interpolation between waypoints and path densification
pub mod densify;
pub use densify::{densify_path, interpolate_between};

// Matching a densified path to the target distance
pub mod length_match;
pub use length_match::{match_length, select_strategy, LengthMatch, MatchStrategy, PathMetrics};

// Constant-speed timestamps
pub mod stamping;
pub use stamping::{stamp_points, TimedPoint, TRACK_POINT_DECIMAL_PLACES};

// Splitting the timed stream into labeled tracks
pub mod segments;
pub use segments::{split_into_segments, TrackSegment, TrackStatus};

// Run payload and pace clamping
pub mod payload;
pub use payload::{average_pace, clamp_pace, resolve_run_id, RunPayload};

// Configuration bag
pub mod config;
pub use config::{CoordinateOffset, PaceBounds, RunConfig, RunRules};

// Waypoint text format
pub mod route_file;
pub use route_file::parse_waypoints;

// Multi-day scheduling
pub mod schedule;
pub use schedule::RunSchedule;

// End-to-end orchestration
pub mod generator;
pub use generator::{generate_batch, generate_run, run_rng, GeneratedRun};

#[cfg(feature = "parallel")]
pub use generator::generate_batch_parallel;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// Equality is exact coordinate identity, which is what duplicate-point
/// suppression relies on.
///
/// # Example
/// ```
/// use trackgen::GpsPoint;
/// let point = GpsPoint::new(31.0250, 121.4350); // Shanghai
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point from the `longitude, latitude` order used by route files.
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Self {
        Self::new(latitude, longitude)
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// Tests
// ============================================================================
