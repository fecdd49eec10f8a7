//! Configuration system using Figment.
//!
//! Strongly-typed configuration loading for the bench. Configuration is
//! loaded from:
//! 1. a TOML file (base configuration, default `config/picbench.toml`)
//! 2. environment variables (prefixed with `PICBENCH_`)
//!
//! # Example
//! ```no_run
//! use picbench::config::Settings;
//!
//! let settings = Settings::load().expect("config");
//! println!("Application: {}", settings.application.name);
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level bench configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Application settings.
    pub application: ApplicationSettings,
    /// Alignment-scan settings.
    pub scan: ScanSettings,
    /// Wavelength-sweep settings.
    pub sweep: SweepSettings,
    /// Data-file output settings.
    pub storage: StorageSettings,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Application name.
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// One (span, step) pair of a coarse-to-fine scan schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PassSettings {
    /// Total sweep span per axis, in stage units.
    pub sweep_distance: f64,
    /// Grid spacing, in stage units.
    pub step_size: f64,
}

/// Alignment-scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Mechanical/optical settle delay after each motion.
    #[serde(with = "humantime_serde", default = "default_settle")]
    pub settle: Duration,
    /// Coarse-to-fine schedule, coarsest pass first.
    pub passes: Vec<PassSettings>,
}

/// Wavelength-sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Sweep start wavelength in nm.
    pub wl_start_nm: f64,
    /// Sweep stop wavelength in nm.
    pub wl_stop_nm: f64,
    /// Sweep duration in seconds.
    pub duration_secs: f64,
    /// Oscilloscope sample rate in Sa/s.
    pub sample_rate: f64,
    /// Laser trigger-output step in nm.
    pub trigger_step_nm: f64,
    /// Laser output power in dBm.
    pub power_dbm: f64,
    /// Extra acquisition time beyond the sweep duration, in seconds.
    #[serde(default = "default_buffer")]
    pub buffer_secs: f64,
    /// Oscilloscope channels to capture.
    pub active_channels: Vec<u8>,
    /// Channel carrying the laser trigger pulses.
    pub trigger_channel: u8,
    /// Edge-trigger level in volts.
    pub trigger_level_volts: f64,
}

/// Data-file output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Output directory for sweep data files.
    pub output_dir: PathBuf,
    /// Chip name embedded in data filenames.
    #[serde(default = "default_chip_name")]
    pub chip_name: String,
}

fn default_settle() -> Duration {
    Duration::from_millis(500)
}

fn default_buffer() -> f64 {
    1.0
}

fn default_chip_name() -> String {
    "chip".to_string()
}

impl Settings {
    /// Load configuration from `config/picbench.toml` and environment
    /// variables.
    ///
    /// Environment variables override configuration with prefix `PICBENCH_`.
    /// Example: `PICBENCH_APPLICATION_LOG_LEVEL=debug`.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/picbench.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PICBENCH_").split("_"))
            .extract()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.scan.passes.is_empty() {
            return Err("Scan schedule must contain at least one pass".to_string());
        }
        for (i, pass) in self.scan.passes.iter().enumerate() {
            if pass.sweep_distance <= 0.0 || pass.step_size <= 0.0 {
                return Err(format!(
                    "Scan pass {} must have positive sweep_distance and step_size",
                    i
                ));
            }
        }

        if self.sweep.wl_stop_nm <= self.sweep.wl_start_nm {
            return Err("wl_stop_nm must be greater than wl_start_nm".to_string());
        }
        if self.sweep.duration_secs <= 0.0 {
            return Err("Sweep duration must be positive".to_string());
        }
        if !self
            .sweep
            .active_channels
            .contains(&self.sweep.trigger_channel)
        {
            return Err(format!(
                "Trigger channel {} must be listed in active_channels",
                self.sweep.trigger_channel
            ));
        }

        Ok(())
    }
}
