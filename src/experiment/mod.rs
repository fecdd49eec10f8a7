//! Experiment orchestration.
//!
//! An [`Experiment`] is a short, linear sequence of device calls with a
//! `setup` / `run` / `teardown` lifecycle. The [`ExperimentRunner`] iterates
//! a set of circuit locations on a chip, driving the full lifecycle once per
//! location, so one measurement routine can be repeated across a device
//! bank.

pub mod sweep;

pub use sweep::WavelengthSweepExperiment;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// A named circuit location on the chip, in stage coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitLocation {
    /// Human-readable identifier (e.g. "mzi_bank_a_3").
    pub name: String,
    /// Row-axis stage coordinate.
    pub x: f64,
    /// Column-axis stage coordinate.
    pub y: f64,
}

impl CircuitLocation {
    /// Create a location.
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// Lifecycle of one bench measurement routine.
///
/// `setup` prepares the instruments, `run` performs the measurement at one
/// circuit location, `teardown` returns the instruments to a safe state.
/// Implementations are free to keep state across locations (the runner
/// drives the full lifecycle once per location, so per-location state should
/// be reset in `setup`).
#[async_trait]
pub trait Experiment: Send {
    /// Prepare instruments for a measurement.
    async fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Perform the measurement at one circuit location.
    async fn run(&mut self, location: &CircuitLocation) -> Result<()>;

    /// Return instruments to a safe state.
    async fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drives an [`Experiment`] across a list of circuit locations.
pub struct ExperimentRunner {
    locations: Vec<CircuitLocation>,
}

impl ExperimentRunner {
    /// Create a runner over the given locations, visited in order.
    pub fn new(locations: Vec<CircuitLocation>) -> Self {
        Self { locations }
    }

    /// The locations this runner will visit.
    pub fn locations(&self) -> &[CircuitLocation] {
        &self.locations
    }

    /// Run the experiment's full lifecycle once per location.
    ///
    /// Teardown is attempted even when `run` fails, so instruments are not
    /// left emitting; the original run error is the one reported.
    pub async fn run_all(&self, experiment: &mut dyn Experiment) -> Result<()> {
        for (i, location) in self.locations.iter().enumerate() {
            info!(
                location = %location.name,
                progress = format!("{}/{}", i + 1, self.locations.len()),
                "starting experiment"
            );

            experiment
                .setup()
                .await
                .with_context(|| format!("setup failed at location '{}'", location.name))?;

            let run_result = experiment
                .run(location)
                .await
                .with_context(|| format!("run failed at location '{}'", location.name));

            let teardown_result = experiment.teardown().await;
            if let Err(e) = &teardown_result {
                error!(location = %location.name, error = %e, "teardown failed");
            }

            run_result?;
            teardown_result
                .with_context(|| format!("teardown failed at location '{}'", location.name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Default)]
    struct RecordingExperiment {
        calls: Vec<String>,
        fail_at: Option<String>,
    }

    #[async_trait]
    impl Experiment for RecordingExperiment {
        async fn setup(&mut self) -> Result<()> {
            self.calls.push("setup".to_string());
            Ok(())
        }

        async fn run(&mut self, location: &CircuitLocation) -> Result<()> {
            self.calls.push(format!("run:{}", location.name));
            if self.fail_at.as_deref() == Some(location.name.as_str()) {
                return Err(anyhow!("injected failure"));
            }
            Ok(())
        }

        async fn teardown(&mut self) -> Result<()> {
            self.calls.push("teardown".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runner_drives_lifecycle_per_location() {
        let runner = ExperimentRunner::new(vec![
            CircuitLocation::new("a", 0.0, 0.0),
            CircuitLocation::new("b", 1.0, 1.0),
        ]);
        let mut exp = RecordingExperiment::default();
        runner.run_all(&mut exp).await.unwrap();

        assert_eq!(
            exp.calls,
            vec!["setup", "run:a", "teardown", "setup", "run:b", "teardown"]
        );
    }

    #[tokio::test]
    async fn test_runner_tears_down_on_failure_and_stops() {
        let runner = ExperimentRunner::new(vec![
            CircuitLocation::new("a", 0.0, 0.0),
            CircuitLocation::new("b", 1.0, 1.0),
        ]);
        let mut exp = RecordingExperiment {
            fail_at: Some("a".to_string()),
            ..Default::default()
        };
        let result = runner.run_all(&mut exp).await;

        assert!(result.is_err());
        assert_eq!(exp.calls, vec!["setup", "run:a", "teardown"]);
    }
}
