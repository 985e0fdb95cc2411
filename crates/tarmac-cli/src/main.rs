//! Tarmac simulator CLI
//!
//! Runs one airport contention simulation and prints the event stream and
//! a final summary.
//!
//! # Example
//!
//! ```bash
//! # The default airport, one second per time unit
//! tarmac-sim --seed 42
//!
//! # A congested airport at 20 ms per unit
//! tarmac-sim --runways 1 --tower 1 --unit-ms 20 --max-aircraft 30
//! ```

mod args;
mod console;
mod summary;

use std::process;

use clap::Parser;
use tarmac::engine::Simulation;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::console::ConsoleReporter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tarmac_engine=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = args.to_config(seed);

    info!(
        seed,
        runways = config.capacities.runway,
        gates = config.capacities.gate,
        tower = config.capacities.tower,
        duration_units = config.duration,
        unit_ms = config.time_unit.as_millis() as u64,
        "starting simulation"
    );

    let reporter = ConsoleReporter::new(config.time_unit, args.quiet);
    if let Err(e) = Simulation::run(config, reporter) {
        eprintln!("Error: {e}");
        process::exit(2);
    }
}
