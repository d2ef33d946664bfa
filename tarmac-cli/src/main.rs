//! Tarmac CLI - Command-line interface
//!
//! This binary drives the tarmac library: it admits a randomized stream of
//! aircraft against a configurable resource pool and prints the end-of-run
//! report.

mod error;
mod runner;

use clap::Parser;
use std::time::Duration;
use tarmac::config::SimulationConfig;
use tarmac::logging;
use tracing::info;

use crate::error::CliError;
use crate::runner::{ReportTable, SimulationRunner};

#[derive(Parser)]
#[command(name = "tarmac")]
#[command(about = "Simulate contended airport ground traffic", long_about = None)]
struct Args {
    /// Number of runways
    #[arg(long, default_value = "3")]
    runways: usize,

    /// Number of passenger gates
    #[arg(long, default_value = "5")]
    gates: usize,

    /// Concurrent aircraft the control tower can handle
    #[arg(long, default_value = "2")]
    tower_slots: usize,

    /// Length of the admission window, in seconds
    #[arg(long, default_value = "300")]
    duration: u64,

    /// Cap on aircraft admitted over the whole run
    #[arg(long, default_value = "1000")]
    max_aircraft: usize,

    /// Fraction of arrivals that are international (0.0 to 1.0)
    #[arg(long, default_value = "0.5")]
    international_ratio: f64,

    /// Seed for arrival pacing and turnaround jitter (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the simulation log file
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.international_ratio) {
        CliError::Config(format!(
            "--international-ratio must be within 0.0..=1.0, got {}",
            args.international_ratio
        ))
        .exit();
    }
    if args.duration == 0 {
        CliError::Config("--duration must be at least 1 second".to_string()).exit();
    }

    let _logging_guard = match logging::init_logging(&args.log_dir, logging::default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let config = SimulationConfig {
        runways: args.runways,
        gates: args.gates,
        tower_slots: args.tower_slots,
        sim_duration: Duration::from_secs(args.duration),
        max_aircraft: args.max_aircraft,
        ..Default::default()
    };

    info!("Tarmac v{}", tarmac::VERSION);
    println!("Tarmac v{} - airport ground-traffic simulator", tarmac::VERSION);
    println!(
        "  Pool: {} runways, {} gates, {} tower slots",
        config.runways, config.gates, config.tower_slots
    );
    println!(
        "  Admissions: up to {} aircraft over {}s ({:.0}% international), seed {}",
        config.max_aircraft,
        args.duration,
        args.international_ratio * 100.0,
        seed
    );
    println!();

    let runner = SimulationRunner::new(config, args.international_ratio, seed);
    let report = runner.run().await;

    println!();
    print!("{}", ReportTable(&report));
}
