use anyhow::Result;
use biosim_common::SimulationConfig;
use biosim_engine::output::save_recording;
use biosim_engine::Session;
use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the headless runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the run configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override timing.total_ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Override initial_conditions.seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting biosim engines (headless)...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(ticks) = args.ticks {
        config.timing.total_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.initial_conditions.seed = seed;
    }
    debug!("Configuration: {:#?}", config);

    // --- Initialize Engines ---
    let output = config.output.clone();
    let mut session = Session::new(config)?;

    // --- Run ---
    let start_time = Instant::now();
    let summary = match session.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run failed after {} frames: {}", session.frames(), e);
            anyhow::bail!("Simulation run failed.");
        }
    };
    let elapsed = start_time.elapsed();
    info!(
        "Ran {} frames ({:.2} s simulated) in {:.3} s wall-clock.",
        summary.frames,
        summary.sim_time_s,
        elapsed.as_secs_f64()
    );
    info!(
        "Drug assay: {} molecules spawned, {} live | healthy {} / affected {} / apoptotic {} / dead {}.",
        summary.molecules_spawned,
        summary.live_molecules,
        summary.final_census.healthy,
        summary.final_census.affected,
        summary.final_census.apoptotic,
        summary.final_census.dead
    );

    // --- Save Recorded Data ---
    info!("Saving {} recorded frames...", summary.records);
    save_recording(session.records(), &output)?;

    info!("Simulation Complete.");
    Ok(())
}
