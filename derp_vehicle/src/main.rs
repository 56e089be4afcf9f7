//! # DERP Vehicle Binary
//!
//! Resolves a vehicle configuration, loads its components and runs the
//! cycle loop until a component requests exit or a signal arrives.
//!
//! # Usage
//!
//! ```bash
//! # Run a vehicle from its config directory
//! derp_vehicle --config config/
//!
//! # Verbose logging, JSON output
//! derp_vehicle --config config/config.toml -v --json
//!
//! # Stop after 1000 cycles
//! derp_vehicle --config config/ --max-cycles 1000
//! ```

use clap::Parser;
use derp_common::config::resolve_config;
use derp_common::consts::DEFAULT_CONFIG_PATH;
use derp_vehicle::{ComponentRegistry, VehicleCore};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// DERP vehicle - runs configured components once per control cycle
#[derive(Parser, Debug)]
#[command(name = "derp_vehicle")]
#[command(version)]
#[command(about = "Runs a vehicle's configured components once per control cycle")]
#[command(long_about = None)]
struct Args {
    /// Path to the vehicle configuration file, or a directory holding config.toml
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Vehicle startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_tracing(&args);

    info!("DERP vehicle v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args.config)?;
    let registry = ComponentRegistry::with_builtin();
    let mut core = VehicleCore::load(&registry, &config)?;

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let result = core.run(args.max_cycles);
    core.shutdown();
    result?;

    info!("DERP vehicle shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
