//! File-facing layer of the `trackgen` command: route file resolution,
//! config loading, deadlines and payload output.
//!
//! The algorithm crate never touches the filesystem; everything that does
//! lives here so it can be tested against temp directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use log::{info, warn};
use trackgen::{
    parse_waypoints, EventSink, GeneratedRun, GenerationError, GpsPoint, Result, RunConfig,
    RunRules, StopCheck,
};

/// Route file written by the map route picker.
pub const USER_ROUTE_FILE: &str = "user.txt";

/// Route file shipped with the tool.
pub const DEFAULT_ROUTE_FILE: &str = "default.txt";

/// Which bundled route to use when no explicit file is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RouteChoice {
    #[default]
    Default,
    User,
}

impl RouteChoice {
    pub fn file_name(&self) -> &'static str {
        match self {
            RouteChoice::Default => DEFAULT_ROUTE_FILE,
            RouteChoice::User => USER_ROUTE_FILE,
        }
    }
}

// ============================================================================
// Route source
// ============================================================================

/// Pick the route file to read.
///
/// The explicit `route_file` (relative paths resolve against `route_dir`) or
/// the chosen bundled route is used when it exists. Otherwise this falls back
/// to `user.txt`, then `default.txt`, in `route_dir`.
pub fn resolve_route_path(
    route_file: Option<&Path>,
    route_dir: &Path,
    choice: RouteChoice,
) -> Result<PathBuf> {
    let requested = match route_file {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => route_dir.join(path),
        None => route_dir.join(choice.file_name()),
    };

    if requested.is_file() {
        info!("Using route file {}", requested.display());
        return Ok(requested);
    }
    warn!(
        "Route file {} not found, trying bundled routes",
        requested.display()
    );

    for name in [USER_ROUTE_FILE, DEFAULT_ROUTE_FILE] {
        let candidate = route_dir.join(name);
        if candidate.is_file() {
            info!("Using route file {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(GenerationError::RouteFile {
        path: requested,
        message: format!(
            "not found, and neither {} nor {} exists in {}",
            USER_ROUTE_FILE,
            DEFAULT_ROUTE_FILE,
            route_dir.display()
        ),
    })
}

/// Read and parse a route file.
pub fn load_waypoints(path: &Path, sink: &dyn EventSink) -> Result<Vec<GpsPoint>> {
    let text = fs::read_to_string(path).map_err(|e| GenerationError::RouteFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let waypoints = parse_waypoints(&text, &path.display().to_string(), sink)?;
    info!("Loaded {} waypoints from {}", waypoints.len(), path.display());
    Ok(waypoints)
}

// ============================================================================
// Config files
// ============================================================================

/// Contents of a `--config` JSON file. Both sections are optional.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub run: RunConfig,
    pub rules: RunRules,
}

pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)?;
    let config: ConfigFile = serde_json::from_str(&text)?;
    config.run.validate()?;
    Ok(config)
}

// ============================================================================
// Deadline
// ============================================================================

/// Stop check that fires once a wall-clock budget has elapsed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    until: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            until: Instant::now() + budget,
        }
    }
}

impl StopCheck for Deadline {
    fn should_stop(&self) -> bool {
        Instant::now() >= self.until
    }
}

// ============================================================================
// Output
// ============================================================================

/// `run-YYYY-MM-DD.json`
pub fn output_file_name(date: NaiveDate) -> String {
    format!("run-{}.json", date.format("%Y-%m-%d"))
}

/// Write each run's payload as pretty JSON into `dir`, one file per date.
pub fn write_runs(dir: &Path, runs: &[(NaiveDate, GeneratedRun)]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(runs.len());
    for (date, run) in runs {
        let path = dir.join(output_file_name(*date));
        fs::write(&path, run.to_json_pretty()?)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(output_file_name(date), "run-2024-03-02.json");
    }

    #[test]
    fn test_route_choice_file_names() {
        assert_eq!(RouteChoice::Default.file_name(), "default.txt");
        assert_eq!(RouteChoice::User.file_name(), "user.txt");
    }

    #[test]
    fn test_deadline() {
        assert!(Deadline::after(Duration::ZERO).should_stop());
        assert!(!Deadline::after(Duration::from_secs(3600)).should_stop());
    }
}
