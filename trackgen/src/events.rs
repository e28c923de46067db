//! Leveled generation events and cooperative cancellation.
//!
//! Every event is written to the `log` facade and then handed to the caller's
//! [`EventSink`], so a UI layer can react to structured conditions such as
//! [`GenerationEvent::RouteTooLong`] without parsing message text.
//!
//! Sinks and stop checks are `Send + Sync`; runs of a batch may report from
//! rayon threads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::{error, info, warn};

use crate::length_match::MatchStrategy;

/// Severity of an event, mirroring the levels a UI log pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// Which pace bound a clamp hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceBound {
    /// Computed pace was faster than allowed
    Min,
    /// Computed pace was slower than allowed
    Max,
}

/// Something worth telling the caller while a run is generated.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// One pass of the drawn route is already longer than the target.
    /// The track is truncated; the UI may want to ask for a shorter route.
    RouteTooLong { actual_m: f64, target_m: f64 },
    /// Strategy chosen by the length-matching engine.
    StrategySelected {
        strategy: MatchStrategy,
        start_end_m: f64,
    },
    /// Summary of the length-matching pass.
    PathAdjusted {
        single_loop_m: f64,
        final_m: f64,
    },
    /// A geometric corner case was handled by a fallback.
    DegenerateGeometry { reason: String },
    /// Average pace fell outside the bounds and was clamped (min/km).
    PaceClamped {
        computed: u32,
        clamped: u32,
        bound: PaceBound,
    },
    /// A route file line that did not parse as `longitude,latitude`.
    SkippedLine { line_number: usize, content: String },
    /// The configured interval was unusable and the default was used.
    IntervalDefaulted { interval_s: u32 },
    /// Generation was interrupted by the stop check.
    Stopped,
    /// A run finished.
    Completed {
        distance_m: f64,
        duration_s: u64,
        segments: usize,
    },
}

impl GenerationEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            GenerationEvent::RouteTooLong { .. }
            | GenerationEvent::DegenerateGeometry { .. }
            | GenerationEvent::PaceClamped { .. }
            | GenerationEvent::SkippedLine { .. }
            | GenerationEvent::IntervalDefaulted { .. }
            | GenerationEvent::Stopped => EventLevel::Warning,
            GenerationEvent::StrategySelected { .. } | GenerationEvent::PathAdjusted { .. } => {
                EventLevel::Info
            }
            GenerationEvent::Completed { .. } => EventLevel::Success,
        }
    }
}

impl fmt::Display for GenerationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationEvent::RouteTooLong { actual_m, target_m } => write!(
                f,
                "Single pass of the route is {:.2}m, longer than the {:.0}m target (with compensation); truncating",
                actual_m, target_m
            ),
            GenerationEvent::StrategySelected {
                strategy,
                start_end_m,
            } => write!(
                f,
                "Using {} strategy: start/end distance {:.2}m",
                strategy.as_str(),
                start_end_m
            ),
            GenerationEvent::PathAdjusted {
                single_loop_m,
                final_m,
            } => write!(
                f,
                "Single loop {:.2}m, final length {:.2}m",
                single_loop_m, final_m
            ),
            GenerationEvent::DegenerateGeometry { reason } => {
                write!(f, "Degenerate geometry: {}", reason)
            }
            GenerationEvent::PaceClamped {
                computed,
                clamped,
                bound,
            } => {
                let direction = match bound {
                    PaceBound::Min => "faster than the minimum",
                    PaceBound::Max => "slower than the maximum",
                };
                write!(
                    f,
                    "Calculated pace {} min/km ({} s/km) is {} allowed pace; adjusted to {} min/km",
                    computed,
                    computed * 60,
                    direction,
                    clamped
                )
            }
            GenerationEvent::SkippedLine {
                line_number,
                content,
            } => write!(f, "Could not parse coordinate line {}: {}", line_number, content),
            GenerationEvent::IntervalDefaulted { interval_s } => {
                write!(f, "Interval must be positive; using {}s", interval_s)
            }
            GenerationEvent::Stopped => write!(f, "Track generation was interrupted"),
            GenerationEvent::Completed {
                distance_m,
                duration_s,
                segments,
            } => write!(
                f,
                "Generated {:.2}m over {}s in {} segments",
                distance_m, duration_s, segments
            ),
        }
    }
}

/// Receives events during generation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GenerationEvent);
}

/// Discards events (they still reach the log facade).
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &GenerationEvent) {}
}

/// Keeps every event; useful for tests and for UIs that render afterwards.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<GenerationEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<GenerationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &GenerationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

impl<F> EventSink for F
where
    F: Fn(&GenerationEvent) + Send + Sync,
{
    fn emit(&self, event: &GenerationEvent) {
        self(event)
    }
}

/// Log an event at its level and forward it to the sink.
pub(crate) fn report(sink: &dyn EventSink, event: GenerationEvent) {
    match event.level() {
        EventLevel::Info | EventLevel::Success => info!("{}", event),
        EventLevel::Warning => warn!("{}", event),
        EventLevel::Error => error!("{}", event),
    }
    sink.emit(&event);
}

/// Polled between units of work; returning true aborts generation.
pub trait StopCheck: Send + Sync {
    fn should_stop(&self) -> bool;
}

/// Never stops.
pub struct NeverStop;

impl StopCheck for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

impl StopCheck for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<F> StopCheck for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

/// Poll the stop check; on a stop, report it and return the error.
pub(crate) fn check_stop(stop: &dyn StopCheck, sink: &dyn EventSink) -> crate::Result<()> {
    if stop.should_stop() {
        report(sink, GenerationEvent::Stopped);
        return Err(crate::GenerationError::Stopped);
    }
    Ok(())
}
