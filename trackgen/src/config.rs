//! Run configuration.
//!
//! `RunConfig` is the read-only bag a caller hands to the generator. Every
//! field has a default, so partial JSON config files deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::length_match::DEFAULT_COMPENSATION_M;
use crate::segments::DEFAULT_MIN_SEGMENT_POINTS;
use crate::{GenerationError, GpsPoint, Result};

/// Interval used when the configured one is zero.
pub const DEFAULT_INTERVAL_S: u32 = 3;

/// Speed used when the planned duration is zero (about 15 km/h).
pub const FALLBACK_SPEED_MPS: f64 = 4.17;

/// Run id that the rules service uses as "unset".
pub const SENTINEL_RUN_ID: i64 = 6;

/// Id substituted for [`SENTINEL_RUN_ID`].
pub const ALTERNATE_RUN_ID: i64 = 9;

/// Allowed average pace range in seconds per kilometer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaceBounds {
    /// Fastest allowed pace. Default: 180 s/km (3 min/km)
    pub min_s_per_km: f64,
    /// Slowest allowed pace. Default: 540 s/km (9 min/km)
    pub max_s_per_km: f64,
}

impl Default for PaceBounds {
    fn default() -> Self {
        Self {
            min_s_per_km: 180.0,
            max_s_per_km: 540.0,
        }
    }
}

/// Constant shift applied to every waypoint before densification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateOffset {
    pub longitude: f64,
    pub latitude: f64,
}

impl CoordinateOffset {
    /// Correction for coordinates picked on the web map route planner,
    /// which sit north-east of where the recorded positions land.
    pub const MAP_PICKER: CoordinateOffset = CoordinateOffset {
        longitude: -0.006_418_714_947_35,
        latitude: -0.006_308_889_764_77,
    };

    pub fn apply(&self, point: &GpsPoint) -> GpsPoint {
        GpsPoint::new(
            point.latitude + self.latitude,
            point.longitude + self.longitude,
        )
    }
}

/// Rules supplied alongside a run (the "point rules" of the upload service).
///
/// Any value present overrides the corresponding configured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRules {
    pub id: Option<i64>,
    /// Fastest allowed pace in s/km
    pub spmin: Option<f64>,
    /// Slowest allowed pace in s/km
    pub spmax: Option<f64>,
}

impl RunRules {
    /// Pace bounds after applying the rules' overrides.
    pub fn pace_bounds(&self, configured: PaceBounds) -> PaceBounds {
        PaceBounds {
            min_s_per_km: self.spmin.unwrap_or(configured.min_s_per_km),
            max_s_per_km: self.spmax.unwrap_or(configured.max_s_per_km),
        }
    }
}

/// Configuration for generating one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Target distance in kilometers. Default: 5.0
    pub target_distance_km: f64,

    /// Seconds between recorded samples. Default: 3
    pub interval_s: u32,

    /// Planned pace in seconds per kilometer; sets the run duration.
    /// Default: 240.0 (4 min/km)
    pub pace_s_per_km: f64,

    /// Use this speed instead of the one derived from distance and pace.
    pub speed_override_mps: Option<f64>,

    /// Bounds for the reported average pace.
    pub pace_bounds: PaceBounds,

    /// Epoch milliseconds of the first sample. None = now.
    pub start_time_ms: Option<i64>,

    /// Copied into the payload.
    pub user_id: String,

    /// Meters added to the target before length matching. Default: 200.0
    pub compensation_m: f64,

    /// Minimum points per track segment. Default: 5
    pub min_segment_points: usize,

    /// Shift applied to the waypoints. Default: none
    pub coordinate_offset: Option<CoordinateOffset>,

    /// Seed for segment lengths, labels and ids. None = entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_distance_km: 5.0,
            interval_s: DEFAULT_INTERVAL_S,
            pace_s_per_km: 240.0,
            speed_override_mps: None,
            pace_bounds: PaceBounds::default(),
            start_time_ms: None,
            user_id: String::new(),
            compensation_m: DEFAULT_COMPENSATION_M,
            min_segment_points: DEFAULT_MIN_SEGMENT_POINTS,
            coordinate_offset: None,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Reject values the generator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_distance_km.is_finite() && self.target_distance_km > 0.0) {
            return Err(GenerationError::config(format!(
                "target distance must be positive, got {} km",
                self.target_distance_km
            )));
        }
        if !(self.pace_s_per_km.is_finite() && self.pace_s_per_km >= 0.0) {
            return Err(GenerationError::config(format!(
                "pace must be non-negative, got {} s/km",
                self.pace_s_per_km
            )));
        }
        if let Some(speed) = self.speed_override_mps {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(GenerationError::config(format!(
                    "speed override must be positive, got {} m/s",
                    speed
                )));
            }
        }
        let bounds = self.pace_bounds;
        if !(bounds.min_s_per_km > 0.0 && bounds.min_s_per_km <= bounds.max_s_per_km) {
            return Err(GenerationError::config(format!(
                "pace bounds must satisfy 0 < min <= max, got {}..{} s/km",
                bounds.min_s_per_km, bounds.max_s_per_km
            )));
        }
        if !(self.compensation_m.is_finite() && self.compensation_m >= 0.0) {
            return Err(GenerationError::config(format!(
                "compensation must be non-negative, got {} m",
                self.compensation_m
            )));
        }
        Ok(())
    }

    pub fn target_distance_m(&self) -> f64 {
        self.target_distance_km * 1000.0
    }

    /// Planned duration in whole seconds, rounding half to even.
    pub fn planned_duration_s(&self) -> u64 {
        (self.pace_s_per_km * self.target_distance_km).round_ties_even() as u64
    }

    /// Constant speed of the synthetic runner.
    pub fn speed_mps(&self) -> f64 {
        if let Some(speed) = self.speed_override_mps {
            return speed;
        }
        match self.planned_duration_s() {
            0 => FALLBACK_SPEED_MPS,
            duration => self.target_distance_m() / duration as f64,
        }
    }

    /// Interval actually used; zero falls back to [`DEFAULT_INTERVAL_S`].
    pub fn effective_interval_s(&self) -> u32 {
        if self.interval_s == 0 {
            DEFAULT_INTERVAL_S
        } else {
            self.interval_s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_speed_is_four_minute_pace() {
        let config = RunConfig::default();
        assert_eq!(config.planned_duration_s(), 1200);
        assert!((config.speed_mps() - 1000.0 / 240.0).abs() < 1e-12);
    }

    #[test]
    fn test_speed_override_wins() {
        let config = RunConfig {
            speed_override_mps: Some(3.0),
            ..RunConfig::default()
        };
        assert_eq!(config.speed_mps(), 3.0);
    }

    #[test]
    fn test_zero_pace_falls_back() {
        let config = RunConfig {
            pace_s_per_km: 0.0,
            ..RunConfig::default()
        };
        assert_eq!(config.speed_mps(), FALLBACK_SPEED_MPS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_distance = RunConfig {
            target_distance_km: 0.0,
            ..RunConfig::default()
        };
        assert!(bad_distance.validate().is_err());

        let inverted = RunConfig {
            pace_bounds: PaceBounds {
                min_s_per_km: 600.0,
                max_s_per_km: 300.0,
            },
            ..RunConfig::default()
        };
        assert!(inverted.validate().is_err());

        let negative = RunConfig {
            compensation_m: -1.0,
            ..RunConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"target_distance_km": 3.0, "seed": 42}"#).unwrap();
        assert_eq!(config.target_distance_km, 3.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.interval_s, DEFAULT_INTERVAL_S);
        assert_eq!(config.compensation_m, DEFAULT_COMPENSATION_M);
    }

    #[test]
    fn test_rules_override_bounds() {
        let rules = RunRules {
            spmin: Some(200.0),
            ..RunRules::default()
        };
        let bounds = rules.pace_bounds(PaceBounds::default());
        assert_eq!(bounds.min_s_per_km, 200.0);
        assert_eq!(bounds.max_s_per_km, 540.0);
    }

    #[test]
    fn test_map_picker_offset_shifts_south_west() {
        let p = GpsPoint::new(31.0, 121.0);
        let shifted = CoordinateOffset::MAP_PICKER.apply(&p);
        assert!(shifted.latitude < p.latitude);
        assert!(shifted.longitude < p.longitude);
    }
}
