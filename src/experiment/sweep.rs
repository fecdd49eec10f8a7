//! Wavelength-sweep experiment.
//!
//! Orchestrates a laser sweep with synchronized oscilloscope capture: the
//! laser's step-trigger output fires a pulse every fixed wavelength
//! increment, the scope records the pulse train alongside the photodetector
//! channels, and the wavelength analyzer maps captured samples back onto the
//! wavelength axis before the result is written to a `.wlsweep` file.

use crate::analysis::WavelengthAnalyzer;
use crate::config::{StorageSettings, SweepSettings};
use crate::core::{ChannelSettings, Oscilloscope, SweepMode, TunableLaser, Waveform};
use crate::error::BenchError;
use crate::experiment::{CircuitLocation, Experiment};
use crate::storage::{SweepFileMeta, SweepWriter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Sweep rates the lasers on this bench support, in nm/s.
const MIN_SWEEP_RATE: f64 = 1.0;
const MAX_SWEEP_RATE: f64 = 100.0;

/// A wavelength-sweep measurement over a [`TunableLaser`] and an
/// [`Oscilloscope`].
pub struct WavelengthSweepExperiment<L: TunableLaser, O: Oscilloscope> {
    laser: L,
    scope: O,
    settings: SweepSettings,
    chip_name: String,
    writer: SweepWriter,
    channel_settings: HashMap<u8, ChannelSettings>,
    last_output: Option<PathBuf>,
}

impl<L: TunableLaser, O: Oscilloscope> WavelengthSweepExperiment<L, O> {
    /// Create the experiment with default per-channel vertical settings:
    /// a wide range on the trigger channel, a narrow one on detector
    /// channels.
    pub fn new(
        laser: L,
        scope: O,
        settings: SweepSettings,
        storage: &StorageSettings,
    ) -> Self {
        let mut channel_settings = HashMap::new();
        for &ch in &settings.active_channels {
            let defaults = if ch == settings.trigger_channel {
                ChannelSettings {
                    range: 10.0,
                    position: 2.0,
                }
            } else {
                ChannelSettings {
                    range: 0.2,
                    position: 0.0,
                }
            };
            channel_settings.insert(ch, defaults);
        }

        Self {
            laser,
            scope,
            settings,
            chip_name: storage.chip_name.clone(),
            writer: SweepWriter::new(storage.output_dir.clone()),
            channel_settings,
            last_output: None,
        }
    }

    /// Override the vertical settings for one channel.
    pub fn configure_channel(&mut self, channel: u8, settings: ChannelSettings) {
        self.channel_settings.insert(channel, settings);
    }

    /// Path of the most recently written sweep file, if any.
    pub fn last_output(&self) -> Option<&PathBuf> {
        self.last_output.as_ref()
    }

    fn validate(&self) -> Result<(), BenchError> {
        let s = &self.settings;
        let rate = (s.wl_stop_nm - s.wl_start_nm) / s.duration_secs;
        if !(MIN_SWEEP_RATE..=MAX_SWEEP_RATE).contains(&rate) {
            return Err(BenchError::Sweep(format!(
                "sweep rate {rate:.2} nm/s outside supported range {MIN_SWEEP_RATE}-{MAX_SWEEP_RATE} nm/s"
            )));
        }
        if s.wl_start_nm < self.laser.min_wavelength_nm() {
            return Err(BenchError::Sweep(format!(
                "start wavelength {} nm below laser minimum {} nm",
                s.wl_start_nm,
                self.laser.min_wavelength_nm()
            )));
        }
        if s.wl_stop_nm > self.laser.max_wavelength_nm() {
            return Err(BenchError::Sweep(format!(
                "stop wavelength {} nm above laser maximum {} nm",
                s.wl_stop_nm,
                self.laser.max_wavelength_nm()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<L: TunableLaser, O: Oscilloscope> Experiment for WavelengthSweepExperiment<L, O> {
    async fn setup(&mut self) -> Result<()> {
        self.validate()?;
        self.laser.initialize().await.context("laser init")?;
        self.scope.initialize().await.context("scope init")?;
        Ok(())
    }

    async fn run(&mut self, location: &CircuitLocation) -> Result<()> {
        let s = self.settings.clone();

        self.laser.set_power_dbm(s.power_dbm).await?;
        self.laser.open_shutter().await?;
        self.laser.set_sweep_mode(SweepMode::default()).await?;
        info!(step_nm = s.trigger_step_nm, "enabling laser trigger output");
        self.laser.enable_step_trigger(s.trigger_step_nm).await?;

        let acquire_secs = s.duration_secs + s.buffer_secs;
        let num_samples = (acquire_secs * s.sample_rate) as u64;
        info!(
            samples = num_samples,
            sample_rate = s.sample_rate,
            "configuring acquisition"
        );
        self.scope
            .configure_acquisition(s.sample_rate, acquire_secs)
            .await?;

        for &ch in &s.active_channels {
            let mode = if ch == s.trigger_channel {
                "trigger"
            } else {
                "data"
            };
            debug!(channel = ch, mode, "adding channel");
            let settings = self
                .channel_settings
                .get(&ch)
                .copied()
                .ok_or_else(|| BenchError::Sweep(format!("channel {ch} not configured")))?;
            self.scope.configure_channel(ch, settings).await?;
        }
        self.scope
            .set_edge_trigger(s.trigger_channel, s.trigger_level_volts)
            .await?;

        info!("starting acquisition");
        self.scope.start_acquisition().await?;

        info!(
            start_nm = s.wl_start_nm,
            stop_nm = s.wl_stop_nm,
            duration_secs = s.duration_secs,
            "sweeping laser"
        );
        self.laser
            .sweep(s.wl_start_nm, s.wl_stop_nm, s.duration_secs)
            .await?;

        let timeout = Duration::from_secs_f64(s.duration_secs * 3.0);
        self.scope.wait_for_acquisition(timeout).await?;

        let mut raw: HashMap<u8, Waveform> = HashMap::new();
        for &ch in &s.active_channels {
            raw.insert(ch, self.scope.waveform(ch).await?);
        }
        let wavelength_log = self.laser.wavelength_log().await?;
        let expected = wavelength_log.len();

        let trigger = raw
            .get(&s.trigger_channel)
            .ok_or_else(|| BenchError::Sweep("trigger channel missing from capture".into()))?;
        let analyzer = WavelengthAnalyzer::new(wavelength_log, trigger)?;
        info!(
            expected,
            measured = analyzer.num_peaks(),
            "wavelength points"
        );

        let mut channels = Vec::new();
        for &ch in &s.active_channels {
            if ch == s.trigger_channel {
                continue;
            }
            let waveform = &raw[&ch];
            channels.push((ch, analyzer.resample(waveform)?));
        }

        let meta = SweepFileMeta {
            chip_name: self.chip_name.clone(),
            wl_start_nm: s.wl_start_nm,
            wl_stop_nm: s.wl_stop_nm,
            power_dbm: s.power_dbm,
            location: (location.x, location.y),
        };
        let path = self.writer.write(&meta, analyzer.wavelengths(), &channels)?;
        self.last_output = Some(path);
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        self.laser.close_shutter().await?;
        self.laser.shutdown().await?;
        self.scope.shutdown().await?;
        Ok(())
    }
}
