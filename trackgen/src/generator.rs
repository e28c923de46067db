//! End-to-end run generation.
//!
//! waypoints → offset → densify → match length → stamp → segment → payload

use chrono::Utc;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{RunConfig, RunRules, DEFAULT_INTERVAL_S};
use crate::densify::densify_path;
use crate::events::{report, EventSink, GenerationEvent, StopCheck};
use crate::geo_utils::haversine_distance;
use crate::length_match::{match_length, MatchStrategy};
use crate::payload::{average_pace, clamp_pace, resolve_run_id, RunPayload};
use crate::segments::split_into_segments;
use crate::stamping::{stamp_points, TimedPoint};
use crate::{GenerationError, GpsPoint, Result};

/// A generated run plus the figures a caller shows to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRun {
    /// Upload body: a one-element array
    pub payload: Vec<RunPayload>,
    /// Haversine length over the recorded (rounded) points
    pub distance_m: f64,
    /// Whole seconds between first and last sample, at least 1
    pub duration_s: u64,
    pub strategy: MatchStrategy,
}

impl GeneratedRun {
    /// The payload as the JSON the upload endpoint expects.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.payload)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.payload)?)
    }
}

/// Rng for run `index` of a batch: `seed + index`, or entropy when unseeded.
pub fn run_rng(seed: Option<u64>, index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index)),
        None => StdRng::from_entropy(),
    }
}

/// Generate one run from `waypoints`.
///
/// Fails with [`GenerationError::Config`] for an unusable config or an empty
/// waypoint list, and with [`GenerationError::Stopped`] when `stop` signals.
/// Geometric corner cases and out-of-range pace are reported through `sink`
/// and never fail the run.
pub fn generate_run<R: Rng>(
    waypoints: &[GpsPoint],
    config: &RunConfig,
    rules: &RunRules,
    rng: &mut R,
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<GeneratedRun> {
    config.validate()?;
    if waypoints.is_empty() {
        return Err(GenerationError::config("no waypoints to generate a run from"));
    }

    let waypoints: Vec<GpsPoint> = match &config.coordinate_offset {
        Some(offset) => waypoints.iter().map(|p| offset.apply(p)).collect(),
        None => waypoints.to_vec(),
    };

    if config.interval_s == 0 {
        report(
            sink,
            GenerationEvent::IntervalDefaulted {
                interval_s: DEFAULT_INTERVAL_S,
            },
        );
    }
    let interval_s = config.effective_interval_s();
    let speed_mps = config.speed_mps();
    let spacing_m = speed_mps * f64::from(interval_s);
    debug!(
        "speed {:.2} m/s, interval {} s, spacing {:.2} m",
        speed_mps, interval_s, spacing_m
    );

    let detailed = densify_path(&waypoints, spacing_m);
    let matched = match_length(
        &detailed,
        config.target_distance_m(),
        config.compensation_m,
        sink,
    );

    let base_start_ms = config
        .start_time_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let timed = stamp_points(&matched.points, speed_mps, base_start_ms, sink, stop)?;

    let distance_m = recorded_distance(&timed);
    let duration_s = recorded_duration_s(&timed);

    let tracks = split_into_segments(&timed, config.min_segment_points, rng, sink, stop)?;
    let segment_count = tracks.len();

    let bounds = rules.pace_bounds(config.pace_bounds);
    let pace = clamp_pace(
        average_pace(duration_s, distance_m),
        &bounds,
        distance_m,
        sink,
    );

    let payload = RunPayload::assemble(
        resolve_run_id(rules.id),
        pace,
        tracks,
        &config.user_id,
        rng,
    );

    report(
        sink,
        GenerationEvent::Completed {
            distance_m,
            duration_s,
            segments: segment_count,
        },
    );

    Ok(GeneratedRun {
        payload: vec![payload],
        distance_m,
        duration_s,
        strategy: matched.strategy,
    })
}

/// Generate one run per start time, sequentially.
///
/// Run `i` starts at `start_times_ms[i]` and draws from [`run_rng`]`(seed, i)`.
/// The first failure (including a stop) aborts the batch.
pub fn generate_batch(
    waypoints: &[GpsPoint],
    config: &RunConfig,
    rules: &RunRules,
    start_times_ms: &[i64],
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<Vec<GeneratedRun>> {
    start_times_ms
        .iter()
        .enumerate()
        .map(|(i, &start)| batch_run(waypoints, config, rules, i, start, sink, stop))
        .collect()
}

/// Parallel version of [`generate_batch`] using rayon.
///
/// Output order and content match the sequential version for a seeded
/// config; runs share no state.
#[cfg(feature = "parallel")]
pub fn generate_batch_parallel(
    waypoints: &[GpsPoint],
    config: &RunConfig,
    rules: &RunRules,
    start_times_ms: &[i64],
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<Vec<GeneratedRun>> {
    use rayon::prelude::*;

    start_times_ms
        .par_iter()
        .enumerate()
        .map(|(i, &start)| batch_run(waypoints, config, rules, i, start, sink, stop))
        .collect()
}

fn batch_run(
    waypoints: &[GpsPoint],
    config: &RunConfig,
    rules: &RunRules,
    index: usize,
    start_ms: i64,
    sink: &dyn EventSink,
    stop: &dyn StopCheck,
) -> Result<GeneratedRun> {
    let run_config = RunConfig {
        start_time_ms: Some(start_ms),
        ..config.clone()
    };
    let mut rng = run_rng(config.seed, index as u64);
    generate_run(waypoints, &run_config, rules, &mut rng, sink, stop)
}

fn recorded_distance(points: &[TimedPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0].position(), &w[1].position()))
        .sum()
}

fn recorded_duration_s(points: &[TimedPoint]) -> u64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            let elapsed_s = (last.locatetime - first.locatetime) / 1000;
            elapsed_s.max(1) as u64
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingSink, NeverStop, NoopSink};

    fn waypoints() -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(31.0250, 121.4350),
            GpsPoint::new(31.0260, 121.4370),
            GpsPoint::new(31.0245, 121.4390),
        ]
    }

    fn config() -> RunConfig {
        RunConfig {
            target_distance_km: 1.0,
            start_time_ms: Some(1_700_000_000_000),
            seed: Some(7),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_empty_waypoints_rejected() {
        let result = generate_run(
            &[],
            &config(),
            &RunRules::default(),
            &mut run_rng(Some(1), 0),
            &NoopSink,
            &NeverStop,
        );
        assert!(matches!(result, Err(GenerationError::Config { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = RunConfig {
            target_distance_km: -1.0,
            ..config()
        };
        let result = generate_run(
            &waypoints(),
            &bad,
            &RunRules::default(),
            &mut run_rng(Some(1), 0),
            &NoopSink,
            &NeverStop,
        );
        assert!(matches!(result, Err(GenerationError::Config { .. })));
    }

    #[test]
    fn test_zero_interval_defaults_with_event() {
        let sink = CollectingSink::new();
        let cfg = RunConfig {
            interval_s: 0,
            ..config()
        };
        generate_run(
            &waypoints(),
            &cfg,
            &RunRules::default(),
            &mut run_rng(Some(1), 0),
            &sink,
            &NeverStop,
        )
        .unwrap();
        assert!(sink
            .events()
            .contains(&GenerationEvent::IntervalDefaulted { interval_s: 3 }));
    }

    #[test]
    fn test_run_starts_at_configured_time() {
        let run = generate_run(
            &waypoints(),
            &config(),
            &RunRules::default(),
            &mut run_rng(Some(1), 0),
            &NoopSink,
            &NeverStop,
        )
        .unwrap();
        let first = &run.payload[0].tracks[0].points[0];
        assert_eq!(first.locatetime, 1_700_000_000_000);
    }

    #[test]
    fn test_completed_event_matches_summary() {
        let sink = CollectingSink::new();
        let run = generate_run(
            &waypoints(),
            &config(),
            &RunRules::default(),
            &mut run_rng(Some(1), 0),
            &sink,
            &NeverStop,
        )
        .unwrap();
        let completed = sink.events().into_iter().find_map(|e| match e {
            GenerationEvent::Completed {
                distance_m,
                duration_s,
                segments,
            } => Some((distance_m, duration_s, segments)),
            _ => None,
        });
        assert_eq!(
            completed,
            Some((run.distance_m, run.duration_s, run.payload[0].tracks.len()))
        );
    }

    #[test]
    fn test_recorded_duration_floor_and_minimum() {
        let point = |t: i64| TimedPoint {
            latitude: 31.0,
            longitude: 121.0,
            locatetime: t,
            step: 0,
        };
        assert_eq!(recorded_duration_s(&[]), 0);
        assert_eq!(recorded_duration_s(&[point(0)]), 1);
        assert_eq!(recorded_duration_s(&[point(0), point(2_999)]), 2);
    }

    #[test]
    fn test_batch_runs_use_their_start_times() {
        let starts = [1_700_000_000_000, 1_699_913_600_000];
        let runs = generate_batch(
            &waypoints(),
            &config(),
            &RunRules::default(),
            &starts,
            &NoopSink,
            &NeverStop,
        )
        .unwrap();
        assert_eq!(runs.len(), 2);
        for (run, start) in runs.iter().zip(starts) {
            assert_eq!(run.payload[0].tracks[0].start_time_ms, start);
        }
        assert_ne!(runs[0].payload[0].sid, runs[1].payload[0].sid);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batch_matches_sequential() {
        let starts = [1_700_000_000_000, 1_699_913_600_000, 1_699_827_200_000];
        let sequential = generate_batch(
            &waypoints(),
            &config(),
            &RunRules::default(),
            &starts,
            &NoopSink,
            &NeverStop,
        )
        .unwrap();
        let parallel = generate_batch_parallel(
            &waypoints(),
            &config(),
            &RunRules::default(),
            &starts,
            &NoopSink,
            &NeverStop,
        )
        .unwrap();
        assert_eq!(sequential, parallel);
    }
}
