//! trackgen - generate synthetic GPS run payloads from a route file
//!
//! Usage:
//!   trackgen [--route user | --route-file <path>] [-d <km>] [-t <days>] [-o <dir>]
//!
//! One run is generated per day, going backwards from `--start-date`
//! (yesterday by default). Payloads go to stdout, or to `run-YYYY-MM-DD.json`
//! files with `--output`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::{Local, NaiveDate, Offset};
use clap::Parser;
use log::info;
use trackgen::{
    CoordinateOffset, GeneratedRun, GenerationEvent, NeverStop, OptionExt, Result, RunConfig,
    RunSchedule, StopCheck,
};
use trackgen_cli::{
    load_config, load_waypoints, resolve_route_path, write_runs, ConfigFile, Deadline, RouteChoice,
};

#[derive(Parser)]
#[command(name = "trackgen")]
#[command(about = "Generate synthetic GPS run tracks from a hand-drawn route", long_about = None)]
struct Cli {
    /// Route file with one `longitude,latitude` per line (overrides --route)
    #[arg(long)]
    route_file: Option<PathBuf>,

    /// Bundled route to use when no route file is given
    #[arg(short, long, value_enum, default_value_t = RouteChoice::Default)]
    route: RouteChoice,

    /// Directory holding user.txt / default.txt
    #[arg(long, default_value = ".")]
    route_dir: PathBuf,

    /// JSON config file with optional `run` and `rules` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target distance in km
    #[arg(short, long)]
    distance: Option<f64>,

    /// Planned pace in min/km
    #[arg(short = 'P', long)]
    pace: Option<f64>,

    /// Use this speed in m/s instead of the one derived from distance and pace
    #[arg(short, long)]
    speed_override: Option<f64>,

    /// Distance compensation in meters
    #[arg(short, long)]
    compensation: Option<f64>,

    /// Seconds between GPS points
    #[arg(short, long)]
    interval: Option<u32>,

    /// Fastest allowed average pace in s/km
    #[arg(long)]
    min_pace: Option<f64>,

    /// Slowest allowed average pace in s/km
    #[arg(long)]
    max_pace: Option<f64>,

    /// Run start hour (local time)
    #[arg(short = 'H', long, default_value = "8")]
    hour: u32,

    /// Run start minute
    #[arg(long, default_value = "0")]
    minute: u32,

    /// First run date, YYYY-MM-DD (default: yesterday)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Number of days to generate, counting backwards
    #[arg(short, long, default_value = "1")]
    times: u32,

    /// User id written into the payload
    #[arg(short, long)]
    user_id: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Shift coordinates picked on the web map route planner
    #[arg(long)]
    picker_offset: bool,

    /// Output directory for run-YYYY-MM-DD.json files (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort generation after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_stopped() => {
            eprintln!("[STOPPED] {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ConfigFile {
        run: mut config,
        rules,
    } = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };
    apply_overrides(cli, &mut config);
    config.validate()?;

    let start_date = match cli.start_date {
        Some(date) => date,
        None => Local::now()
            .date_naive()
            .pred_opt()
            .ok_or_config("cannot compute yesterday's date")?,
    };
    let schedule = RunSchedule {
        start_date,
        hour: cli.hour,
        minute: cli.minute,
        times: cli.times,
        offset: Local::now().offset().fix(),
    };
    let instants = schedule.start_instants()?;
    let start_times = schedule.start_times_ms()?;

    let sink = |event: &GenerationEvent| {
        if let GenerationEvent::RouteTooLong { actual_m, target_m } = event {
            eprintln!();
            eprintln!(
                "!! The drawn route ({:.0} m) is longer than the target ({:.0} m).",
                actual_m, target_m
            );
            eprintln!("!! The track will be cut short; consider drawing a shorter route.");
            eprintln!();
        }
    };

    let route_path = resolve_route_path(cli.route_file.as_deref(), &cli.route_dir, cli.route)?;
    let waypoints = load_waypoints(&route_path, &sink)?;

    let stop: Box<dyn StopCheck> = match cli.timeout_secs {
        Some(secs) => Box::new(Deadline::after(Duration::from_secs(secs))),
        None => Box::new(NeverStop),
    };

    #[cfg(feature = "parallel")]
    let runs = trackgen::generate_batch_parallel(
        &waypoints,
        &config,
        &rules,
        &start_times,
        &sink,
        stop.as_ref(),
    )?;
    #[cfg(not(feature = "parallel"))]
    let runs = trackgen::generate_batch(
        &waypoints,
        &config,
        &rules,
        &start_times,
        &sink,
        stop.as_ref(),
    )?;

    let dated: Vec<(NaiveDate, GeneratedRun)> = instants
        .iter()
        .map(|t| t.date_naive())
        .zip(runs)
        .collect();

    for (date, run) in &dated {
        info!(
            "{}: {:.2} km in {} s, {} min/km ({})",
            date,
            run.distance_m / 1000.0,
            run.duration_s,
            run.payload[0].spavg,
            run.strategy.as_str()
        );
    }

    match &cli.output {
        Some(dir) => {
            write_runs(dir, &dated)?;
        }
        None => {
            for (_, run) in &dated {
                println!("{}", run.to_json_pretty()?);
            }
        }
    }
    Ok(())
}

/// Command line values win over the config file.
fn apply_overrides(cli: &Cli, config: &mut RunConfig) {
    if let Some(km) = cli.distance {
        config.target_distance_km = km;
    }
    if let Some(min_per_km) = cli.pace {
        config.pace_s_per_km = min_per_km * 60.0;
    }
    if cli.speed_override.is_some() {
        config.speed_override_mps = cli.speed_override;
    }
    if let Some(meters) = cli.compensation {
        config.compensation_m = meters;
    }
    if let Some(seconds) = cli.interval {
        config.interval_s = seconds;
    }
    if let Some(min) = cli.min_pace {
        config.pace_bounds.min_s_per_km = min;
    }
    if let Some(max) = cli.max_pace {
        config.pace_bounds.max_s_per_km = max;
    }
    if let Some(user_id) = &cli.user_id {
        config.user_id = user_id.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.picker_offset {
        config.coordinate_offset = Some(CoordinateOffset::MAP_PICKER);
    }
}
