//! Matching a densified route to a target distance.
//!
//! The engine measures one pass over the densified route and picks exactly
//! one strategy per call:
//!
//! - **Truncate** - one pass is already longer than the target; cut it.
//! - **RoundTrip** - open route (start and end more than
//!   [`LOOP_CLOSURE_THRESHOLD_M`] apart); run A→B→A repeatedly.
//! - **LoopRepeat** - (nearly) closed route; run the loop repeatedly.
//! - **ExactMatch** - one pass is exactly the target.
//!
//! Partial passes always end on an interpolated cutoff point, so the
//! output length lands on the compensated target instead of the nearest
//! densified point.

use crate::events::{report, EventSink, GenerationEvent};
use crate::geo_utils::{haversine_distance, lerp, polyline_length};
use crate::GpsPoint;

/// Distance added to every target before matching, in meters.
pub const DEFAULT_COMPENSATION_M: f64 = 200.0;

/// Start/end separation at or below which a route is treated as a loop.
pub const LOOP_CLOSURE_THRESHOLD_M: f64 = 15.0;

/// Shortest loop worth repeating; anything shorter is degenerate.
pub const MIN_LOOP_DISTANCE_M: f64 = 1.0;

/// Leftover distance treated as zero when splitting into whole passes.
const REMAINDER_TOLERANCE_M: f64 = 1e-6;

/// How the densified route was stretched or cut to reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Truncate,
    RoundTrip,
    LoopRepeat,
    ExactMatch,
    /// Fewer than two points; nothing to match.
    Degenerate,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Truncate => "truncate",
            MatchStrategy::RoundTrip => "round-trip",
            MatchStrategy::LoopRepeat => "loop",
            MatchStrategy::ExactMatch => "exact",
            MatchStrategy::Degenerate => "degenerate",
        }
    }
}

/// Measurements that drive strategy selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathMetrics {
    /// Length of one forward pass over the densified route
    pub single_loop_distance: f64,
    /// Straight distance between the first and last densified point
    pub start_end_distance: f64,
    /// Target before compensation
    pub target_distance: f64,
    /// `target_distance + compensation`
    pub compensated_target: f64,
    /// Number of densified points measured
    pub point_count: usize,
}

impl PathMetrics {
    pub fn measure(detailed: &[GpsPoint], target_m: f64, compensation_m: f64) -> Self {
        let start_end_distance = match (detailed.first(), detailed.last()) {
            (Some(first), Some(last)) => haversine_distance(first, last),
            _ => 0.0,
        };
        Self {
            single_loop_distance: polyline_length(detailed),
            start_end_distance,
            target_distance: target_m,
            compensated_target: target_m + compensation_m,
            point_count: detailed.len(),
        }
    }
}

/// Result of one length-matching pass.
#[derive(Debug, Clone)]
pub struct LengthMatch {
    pub strategy: MatchStrategy,
    pub metrics: PathMetrics,
    pub points: Vec<GpsPoint>,
    /// Cumulative haversine length of `points`
    pub distance_m: f64,
}

/// Pick the strategy. Deterministic in the metrics alone.
pub fn select_strategy(metrics: &PathMetrics) -> MatchStrategy {
    if metrics.point_count < 2 {
        MatchStrategy::Degenerate
    } else if metrics.single_loop_distance > metrics.compensated_target {
        MatchStrategy::Truncate
    } else if metrics.single_loop_distance < metrics.compensated_target {
        if metrics.start_end_distance > LOOP_CLOSURE_THRESHOLD_M {
            MatchStrategy::RoundTrip
        } else {
            MatchStrategy::LoopRepeat
        }
    } else {
        MatchStrategy::ExactMatch
    }
}

/// Stretch or cut `detailed` so its length approximates
/// `target_m + compensation_m`.
///
/// Consecutive equal points are collapsed before any strategy runs, so the
/// output never repeats a point. Reports [`GenerationEvent::RouteTooLong`]
/// when truncating, and falls back to the unchanged input for degenerate
/// routes.
pub fn match_length(
    detailed: &[GpsPoint],
    target_m: f64,
    compensation_m: f64,
    sink: &dyn EventSink,
) -> LengthMatch {
    let metrics = PathMetrics::measure(detailed, target_m, compensation_m);
    let strategy = select_strategy(&metrics);
    let path = collapse_repeats(detailed);

    let mut points = match strategy {
        MatchStrategy::Degenerate => {
            report(
                sink,
                GenerationEvent::DegenerateGeometry {
                    reason: format!(
                        "route has {} point(s); using it unchanged",
                        detailed.len()
                    ),
                },
            );
            detailed.to_vec()
        }
        MatchStrategy::Truncate => {
            report(
                sink,
                GenerationEvent::RouteTooLong {
                    actual_m: metrics.single_loop_distance,
                    target_m: metrics.target_distance,
                },
            );
            truncate(&path, &metrics)
        }
        MatchStrategy::RoundTrip => {
            report(
                sink,
                GenerationEvent::StrategySelected {
                    strategy,
                    start_end_m: metrics.start_end_distance,
                },
            );
            round_trip(&path, &metrics)
        }
        MatchStrategy::LoopRepeat => {
            report(
                sink,
                GenerationEvent::StrategySelected {
                    strategy,
                    start_end_m: metrics.start_end_distance,
                },
            );
            if metrics.single_loop_distance >= MIN_LOOP_DISTANCE_M {
                loop_repeat(&path, &metrics)
            } else {
                report(
                    sink,
                    GenerationEvent::DegenerateGeometry {
                        reason: format!(
                            "loop is only {:.3e}m long; using route unchanged",
                            metrics.single_loop_distance
                        ),
                    },
                );
                detailed.to_vec()
            }
        }
        MatchStrategy::ExactMatch => path,
    };

    if points.is_empty() {
        points = detailed.to_vec();
    }

    let distance_m = polyline_length(&points);
    report(
        sink,
        GenerationEvent::PathAdjusted {
            single_loop_m: metrics.single_loop_distance,
            final_m: distance_m,
        },
    );

    LengthMatch {
        strategy,
        metrics,
        points,
        distance_m,
    }
}

/// One pass, cut at the compensated target.
fn truncate(path: &[GpsPoint], metrics: &PathMetrics) -> Vec<GpsPoint> {
    walk_budget(path, metrics.compensated_target)
}

/// Whole A→B→A trips, then a forward (or forward plus partial reverse)
/// remainder.
fn round_trip(path: &[GpsPoint], metrics: &PathMetrics) -> Vec<GpsPoint> {
    let trip = 2.0 * metrics.single_loop_distance;
    let (whole_trips, remaining) = split_passes(metrics.compensated_target, trip);
    let reversed: Vec<GpsPoint> = path.iter().rev().copied().collect();

    let mut out = Vec::with_capacity(path.len() * (2 * whole_trips + 2));
    for _ in 0..whole_trips {
        append_merged(&mut out, path);
        append_merged(&mut out, &reversed);
    }

    if remaining > 0.0 {
        if remaining / trip <= 0.5 {
            append_merged(&mut out, &walk_budget(path, remaining));
        } else {
            append_merged(&mut out, path);
            let back = remaining - metrics.single_loop_distance;
            append_merged(&mut out, &walk_budget(&reversed, back));
        }
    }
    out
}

/// Whole loops, then a partial forward loop.
///
/// Consecutive passes are joined by the start/end gap, so each pass after
/// the first costs `loop + gap`. For a closed loop the gap is zero.
fn loop_repeat(path: &[GpsPoint], metrics: &PathMetrics) -> Vec<GpsPoint> {
    let gap = metrics.start_end_distance;
    let pass = metrics.single_loop_distance + gap;
    // k passes cover k × pass − gap
    let (whole_loops, remaining) = split_passes(metrics.compensated_target + gap, pass);

    let mut out = Vec::with_capacity(path.len() * (whole_loops + 1));
    for _ in 0..whole_loops {
        append_merged(&mut out, path);
    }
    // Crossing the gap back to the start is part of the partial pass
    let budget = remaining - gap;
    if budget > REMAINDER_TOLERANCE_M {
        append_merged(&mut out, &walk_budget(path, budget));
    }
    out
}

/// Number of whole passes of `pass_len` in `target`, and the rest.
///
/// A rest within [`REMAINDER_TOLERANCE_M`] of zero or of a full pass is
/// float noise from measuring the pass and is rounded away.
fn split_passes(target: f64, pass_len: f64) -> (usize, f64) {
    let mut whole = (target / pass_len).floor();
    let mut remaining = target - whole * pass_len;
    if pass_len - remaining <= REMAINDER_TOLERANCE_M {
        whole += 1.0;
        remaining = 0.0;
    } else if remaining <= REMAINDER_TOLERANCE_M {
        remaining = 0.0;
    }
    (whole.max(0.0) as usize, remaining.max(0.0))
}

/// Copy of `points` without consecutive repeats.
fn collapse_repeats(points: &[GpsPoint]) -> Vec<GpsPoint> {
    let mut out = Vec::with_capacity(points.len());
    for point in points {
        push_unique(&mut out, *point);
    }
    out
}

/// Walk `path` from its start for `budget` meters.
///
/// Every point reached within the budget is emitted; inside the segment that
/// crosses the budget, the cutoff point is interpolated. A point equal to the
/// one emitted just before it is skipped.
fn walk_budget(path: &[GpsPoint], budget: f64) -> Vec<GpsPoint> {
    let mut out: Vec<GpsPoint> = Vec::new();
    let Some(first) = path.first() else {
        return out;
    };
    out.push(*first);

    let mut travelled = 0.0;
    for pair in path.windows(2) {
        let seg = haversine_distance(&pair[0], &pair[1]);
        if travelled + seg <= budget {
            push_unique(&mut out, pair[1]);
            travelled += seg;
        } else {
            if seg > 0.0 {
                let fraction = (budget - travelled) / seg;
                push_unique(&mut out, lerp(&pair[0], &pair[1], fraction));
            }
            break;
        }
    }
    out
}

#[inline]
fn push_unique(out: &mut Vec<GpsPoint>, point: GpsPoint) {
    if out.last() != Some(&point) {
        out.push(point);
    }
}

/// Append `next` to `out`, dropping its first point when it repeats the last
/// emitted one.
fn append_merged(out: &mut Vec<GpsPoint>, next: &[GpsPoint]) {
    match (out.last(), next.first()) {
        (Some(last), Some(first)) if last == first => out.extend_from_slice(&next[1..]),
        _ => out.extend_from_slice(next),
    }
}
