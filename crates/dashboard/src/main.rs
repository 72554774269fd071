//! Traffic Signal Dashboard - Main Entry Point

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashboard::{build_pipeline, init_logging, Settings};
use detection::build_detector;
use signal_control::SignalTimingPolicy;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "traffic-dashboard",
    version,
    about = "Zone-based vehicle counting and adaptive green-light timing"
)]
struct Cli {
    /// TOML configuration file; NETRA__SECTION__KEY variables override it
    #[arg(long, short, global = true, env = "NETRA_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the frame loop until the source ends or Ctrl-C
    Run {
        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,
    },

    /// Validate the configuration and print the zones and timing table
    Check,

    /// Print the class vocabulary of each configured detector
    Labels,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { max_frames } => run(&settings, max_frames),
        Command::Check => check(&settings),
        Command::Labels => labels(&settings),
    }
}

fn run(settings: &Settings, max_frames: Option<u64>) -> Result<()> {
    info!("=== Traffic Signal Dashboard v{} ===", env!("CARGO_PKG_VERSION"));

    let mut pipeline = build_pipeline(settings)?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    info!("Processing frames from {} (Ctrl-C to stop)", settings.source.dir.display());
    let summary = pipeline.run(&stop, max_frames);

    info!(
        "Processed {} frames ({} with ambulance), {} telemetry rows, {} overlay frames",
        summary.frames_processed,
        summary.frames_with_ambulance,
        summary.telemetry_rows,
        summary.overlay_frames
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn check(settings: &Settings) -> Result<()> {
    println!("Configuration OK");
    println!("Zones (first match wins):");
    for zone in &settings.zones {
        let b = zone.bbox;
        println!("  {:<16} [{}, {}, {}, {}]", zone.id, b.x1, b.y1, b.x2, b.y2);
    }

    let timing = SignalTimingPolicy::new(&settings.timing);
    println!("Green time by vehicle count:");
    for count in [0, 1, 5, 10, 20, 50] {
        let secs = timing.green_time(count);
        println!("  {:>3} vehicles -> {:>3} s ({})", count, secs, timing.band(secs).as_str());
    }

    if settings.telemetry.enabled {
        println!(
            "Telemetry: {} every {} s",
            settings.telemetry.path.display(),
            settings.telemetry.interval_secs
        );
    }
    Ok(())
}

fn labels(settings: &Settings) -> Result<()> {
    let mut passes = vec![("vehicles", &settings.vehicle_detector)];
    if let Some(config) = &settings.ambulance_detector {
        passes.push(("ambulance", config));
    }

    for (name, config) in passes {
        let detector = build_detector(name, config)
            .with_context(|| format!("Failed to build {} detector", name))?;
        let labels = detector.labels();
        println!("{} ({}): {} classes", name, detector.name(), labels.len());
        for (i, label) in labels.iter().enumerate() {
            println!("  {:>3}: {}", i, label);
        }
    }
    Ok(())
}
