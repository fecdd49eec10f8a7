//! CLI entry point for picbench.
//!
//! Headless bench automation driver. Real instrument drivers live outside
//! this crate, so both commands run against the mock hardware in
//! [`picbench::instrument::mock`] — useful for exercising scan schedules and
//! sweep settings before a bench session, and as a worked example of wiring
//! the library to drivers.
//!
//! # Usage
//!
//! Run a coarse-to-fine alignment scan:
//! ```bash
//! picbench align --config config/picbench.toml
//! ```
//!
//! Run a wavelength sweep and write a `.wlsweep` file:
//! ```bash
//! picbench sweep --config config/picbench.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use picbench::config::Settings;
use picbench::core::Position;
use picbench::experiment::{CircuitLocation, ExperimentRunner, WavelengthSweepExperiment};
use picbench::instrument::{MockDetector, MockLaser, MockScope, MockStage};
use picbench::scan::{AlignmentScanner, ScanPass};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "picbench")]
#[command(about = "Photonic-chip test bench automation", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(long, default_value = "config/picbench.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured coarse-to-fine alignment scan (mock hardware)
    Align,
    /// Run a wavelength sweep and write the data file (mock hardware)
    Sweep {
        /// Circuit location name for the data file
        #[arg(long, default_value = "demo")]
        location: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.application.log_level)),
        )
        .init();

    info!(application = %settings.application.name, "picbench starting");

    match cli.command {
        Commands::Align => align(&settings).await,
        Commands::Sweep { location } => sweep(&settings, location).await,
    }
}

async fn align(settings: &Settings) -> Result<()> {
    let mut stage = MockStage::at(Position::new(0.5, 0.5));
    // Put the coupling peak a few coarse steps away from the probe.
    let peak = Position::new(0.508, 0.494);
    let mut detector =
        MockDetector::gaussian(stage.position_handle(), peak, 0.004, 1.0).with_noise(0.01);

    let passes: Vec<ScanPass> = settings
        .scan
        .passes
        .iter()
        .map(|p| ScanPass::square(p.sweep_distance, p.step_size))
        .collect();

    let mut scanner = AlignmentScanner::new(&mut stage, &mut detector, settings.scan.settle);
    let outcome = scanner.run_coarse_to_fine(&passes).await?;

    match outcome.best {
        Some(best) => info!(
            value = best.value,
            position = %best.position,
            "alignment complete"
        ),
        None => info!("alignment found no signal, stage returned to scan origin"),
    }
    Ok(())
}

async fn sweep(settings: &Settings, location_name: String) -> Result<()> {
    let laser = MockLaser::new();
    let scope = MockScope::new(laser.trigger_pulse_handle());

    let mut experiment = WavelengthSweepExperiment::new(
        laser,
        scope,
        settings.sweep.clone(),
        &settings.storage,
    );

    let runner = ExperimentRunner::new(vec![CircuitLocation::new(location_name, 0.0, 0.0)]);
    runner.run_all(&mut experiment).await?;

    if let Some(path) = experiment.last_output() {
        info!(path = %path.display(), "sweep data written");
    }
    Ok(())
}
