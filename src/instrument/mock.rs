//! Mock hardware implementations.
//!
//! Simulated bench devices for testing and demo runs without physical
//! hardware. All mocks use async-safe operations (`tokio::time::sleep`, not
//! `std::thread::sleep`) and deterministic state behind `Arc<RwLock>` so a
//! detector can observe the stage it is optically coupled to.
//!
//! # Available Mocks
//!
//! - [`MockStage`] - two-axis stage with jog stepping and shared position
//! - [`MockDetector`] - scalar detector sampling a Gaussian coupling peak
//! - [`MockScope`] - oscilloscope synthesizing triggered sweep waveforms
//! - [`MockLaser`] - tunable laser with step-trigger output and wavelength
//!   logging

use crate::core::{
    Axis, ChannelSettings, Detector, Instrument, Oscilloscope, Position, Stage, StepDirection,
    SweepMode, TunableLaser, Waveform,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

// =============================================================================
// MockStage
// =============================================================================

/// Simulated two-axis stage.
///
/// Position is held in a shared handle so a [`MockDetector`] can compute the
/// optical coupling at the probe's current location. Moves complete
/// immediately; the bench's settle delays provide the timing realism.
pub struct MockStage {
    position: Arc<RwLock<Position>>,
    jog_step: f64,
}

impl MockStage {
    /// Create a stage parked at the origin with a 1 µm jog step.
    pub fn new() -> Self {
        Self {
            position: Arc::new(RwLock::new(Position::new(0.0, 0.0))),
            jog_step: 0.001,
        }
    }

    /// Create a stage parked at the given position.
    pub fn at(position: Position) -> Self {
        Self {
            position: Arc::new(RwLock::new(position)),
            jog_step: 0.001,
        }
    }

    /// Shared handle to the stage position for coupled mocks.
    pub fn position_handle(&self) -> Arc<RwLock<Position>> {
        Arc::clone(&self.position)
    }
}

impl Default for MockStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Instrument for MockStage {
    fn id(&self) -> &str {
        "mock_stage"
    }

    async fn initialize(&mut self) -> Result<()> {
        info!("MockStage: initialized");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("MockStage: shut down");
        Ok(())
    }
}

#[async_trait]
impl Stage for MockStage {
    async fn position(&self, axis: Axis) -> Result<f64> {
        let p = self.position.read().await;
        Ok(match axis {
            Axis::X => p.x,
            Axis::Y => p.y,
        })
    }

    async fn move_to(&mut self, target: Position) -> Result<()> {
        debug!(%target, "MockStage: absolute move");
        *self.position.write().await = target;
        Ok(())
    }

    async fn jog_step(&self) -> Result<f64> {
        Ok(self.jog_step)
    }

    async fn set_jog_step(&mut self, size: f64) -> Result<()> {
        if size <= 0.0 {
            return Err(anyhow!("jog step must be positive, got {size}"));
        }
        self.jog_step = size;
        Ok(())
    }

    async fn step(&mut self, axis: Axis, direction: StepDirection) -> Result<()> {
        let delta = match direction {
            StepDirection::Forward => self.jog_step,
            StepDirection::Backward => -self.jog_step,
        };
        let mut p = self.position.write().await;
        match axis {
            Axis::X => p.x += delta,
            Axis::Y => p.y += delta,
        }
        Ok(())
    }
}

// =============================================================================
// MockDetector
// =============================================================================

/// Simulated scalar detector.
///
/// Reads a Gaussian coupling peak evaluated at the shared stage position,
/// with optional seeded noise so repeated reads are reproducible.
pub struct MockDetector {
    stage_position: Arc<RwLock<Position>>,
    peak: Position,
    width: f64,
    amplitude: f64,
    noise: f64,
    rng: StdRng,
}

impl MockDetector {
    /// Detector with a Gaussian peak of the given amplitude and 1/e width
    /// centered at `peak`.
    pub fn gaussian(
        stage_position: Arc<RwLock<Position>>,
        peak: Position,
        width: f64,
        amplitude: f64,
    ) -> Self {
        Self {
            stage_position,
            peak,
            width,
            amplitude,
            noise: 0.0,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    /// Add uniform noise of the given half-amplitude to every reading.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }
}

#[async_trait]
impl Instrument for MockDetector {
    fn id(&self) -> &str {
        "mock_detector"
    }

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Detector for MockDetector {
    async fn measure(&mut self) -> Result<f64> {
        let p = *self.stage_position.read().await;
        let dx = p.x - self.peak.x;
        let dy = p.y - self.peak.y;
        let r2 = (dx * dx + dy * dy) / (self.width * self.width);
        let mut value = self.amplitude * (-r2).exp();
        if self.noise > 0.0 {
            value += self.rng.gen_range(-self.noise..self.noise);
        }
        Ok(value)
    }
}

// =============================================================================
// MockScope
// =============================================================================

/// Simulated oscilloscope.
///
/// Synthesizes a triggered sweep capture: the trigger channel carries one
/// rising pulse per laser trigger (count taken from the shared handle a
/// [`MockLaser`] fills during its sweep), and data channels carry a notch
/// response sampled at each pulse, held between pulses.
pub struct MockScope {
    trigger_pulses: Arc<RwLock<usize>>,
    sample_rate: f64,
    duration_secs: f64,
    channels: HashMap<u8, ChannelSettings>,
    trigger_channel: Option<u8>,
    armed: bool,
}

impl MockScope {
    /// Scope wired to a laser's trigger-pulse counter.
    pub fn new(trigger_pulses: Arc<RwLock<usize>>) -> Self {
        Self {
            trigger_pulses,
            sample_rate: 0.0,
            duration_secs: 0.0,
            channels: HashMap::new(),
            trigger_channel: None,
            armed: false,
        }
    }
}

#[async_trait]
impl Instrument for MockScope {
    fn id(&self) -> &str {
        "mock_scope"
    }

    async fn initialize(&mut self) -> Result<()> {
        info!("MockScope: initialized");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Oscilloscope for MockScope {
    async fn configure_acquisition(&mut self, sample_rate: f64, duration_secs: f64) -> Result<()> {
        if sample_rate <= 0.0 || duration_secs <= 0.0 {
            return Err(anyhow!("sample rate and duration must be positive"));
        }
        self.sample_rate = sample_rate;
        self.duration_secs = duration_secs;
        Ok(())
    }

    async fn configure_channel(&mut self, channel: u8, settings: ChannelSettings) -> Result<()> {
        self.channels.insert(channel, settings);
        Ok(())
    }

    async fn set_edge_trigger(&mut self, channel: u8, _level_volts: f64) -> Result<()> {
        if !self.channels.contains_key(&channel) {
            return Err(anyhow!("trigger channel {channel} is not configured"));
        }
        self.trigger_channel = Some(channel);
        Ok(())
    }

    async fn start_acquisition(&mut self) -> Result<()> {
        if self.trigger_channel.is_none() {
            return Err(anyhow!("cannot start acquisition without a trigger"));
        }
        self.armed = true;
        Ok(())
    }

    async fn wait_for_acquisition(&mut self, _timeout: Duration) -> Result<()> {
        if !self.armed {
            return Err(anyhow!("no acquisition in progress"));
        }
        self.armed = false;
        Ok(())
    }

    async fn waveform(&mut self, channel: u8) -> Result<Waveform> {
        if !self.channels.contains_key(&channel) {
            return Err(anyhow!("channel {channel} is not configured"));
        }
        let pulses = *self.trigger_pulses.read().await;
        let num_samples = (self.sample_rate * self.duration_secs) as usize;
        if num_samples == 0 || pulses == 0 {
            return Ok(Waveform {
                channel,
                sample_rate: self.sample_rate,
                samples: vec![0.0; num_samples],
            });
        }

        // Pulses spread over the first 90% of the record, none at sample 0.
        let spacing = (num_samples * 9 / 10) / pulses;
        let spacing = spacing.max(2);
        let mut samples = vec![0.0; num_samples];

        if Some(channel) == self.trigger_channel {
            for k in 0..pulses {
                let at = (k + 1) * spacing;
                if at < num_samples {
                    samples[at] = 2.0;
                }
            }
        } else {
            // Notch response vs. pulse index, held between pulses.
            let mut level = 1.0;
            let mut pulse = 0usize;
            for (i, s) in samples.iter_mut().enumerate() {
                if pulse < pulses && i == (pulse + 1) * spacing {
                    let t = pulse as f64 / pulses as f64 - 0.5;
                    level = 1.0 - 0.8 * (-(t * t) / 0.005).exp();
                    pulse += 1;
                }
                *s = level;
            }
        }

        Ok(Waveform {
            channel,
            sample_rate: self.sample_rate,
            samples,
        })
    }
}

// =============================================================================
// MockLaser
// =============================================================================

/// Simulated tunable laser (1500–1630 nm).
pub struct MockLaser {
    power_dbm: f64,
    shutter_open: bool,
    sweep_mode: SweepMode,
    trigger_step_nm: Option<f64>,
    wavelength_log: Vec<f64>,
    trigger_pulses: Arc<RwLock<usize>>,
}

impl MockLaser {
    /// Create a laser with the shutter closed and no trigger output.
    pub fn new() -> Self {
        Self {
            power_dbm: 0.0,
            shutter_open: false,
            sweep_mode: SweepMode::default(),
            trigger_step_nm: None,
            wavelength_log: Vec::new(),
            trigger_pulses: Arc::new(RwLock::new(0)),
        }
    }

    /// Shared counter of trigger pulses emitted by the last sweep, for
    /// wiring to a [`MockScope`].
    pub fn trigger_pulse_handle(&self) -> Arc<RwLock<usize>> {
        Arc::clone(&self.trigger_pulses)
    }
}

impl Default for MockLaser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Instrument for MockLaser {
    fn id(&self) -> &str {
        "mock_laser"
    }

    async fn initialize(&mut self) -> Result<()> {
        info!("MockLaser: initialized");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.shutter_open = false;
        Ok(())
    }
}

#[async_trait]
impl TunableLaser for MockLaser {
    fn min_wavelength_nm(&self) -> f64 {
        1500.0
    }

    fn max_wavelength_nm(&self) -> f64 {
        1630.0
    }

    async fn set_power_dbm(&mut self, power: f64) -> Result<()> {
        self.power_dbm = power;
        Ok(())
    }

    async fn open_shutter(&mut self) -> Result<()> {
        self.shutter_open = true;
        Ok(())
    }

    async fn close_shutter(&mut self) -> Result<()> {
        self.shutter_open = false;
        Ok(())
    }

    async fn set_sweep_mode(&mut self, mode: SweepMode) -> Result<()> {
        self.sweep_mode = mode;
        Ok(())
    }

    async fn enable_step_trigger(&mut self, step_nm: f64) -> Result<()> {
        if step_nm <= 0.0 {
            return Err(anyhow!("trigger step must be positive"));
        }
        self.trigger_step_nm = Some(step_nm);
        Ok(())
    }

    async fn sweep(&mut self, start_nm: f64, stop_nm: f64, duration_secs: f64) -> Result<()> {
        if !self.shutter_open {
            return Err(anyhow!("cannot sweep with the shutter closed"));
        }
        if start_nm < self.min_wavelength_nm() || stop_nm > self.max_wavelength_nm() {
            return Err(anyhow!(
                "sweep {start_nm}-{stop_nm} nm outside laser range {}-{} nm",
                self.min_wavelength_nm(),
                self.max_wavelength_nm()
            ));
        }
        let step = self
            .trigger_step_nm
            .ok_or_else(|| anyhow!("trigger output not enabled before sweep"))?;

        self.wavelength_log.clear();
        let mut wl = start_nm;
        while wl <= stop_nm + step / 2.0 {
            self.wavelength_log.push(wl);
            wl += step;
        }
        *self.trigger_pulses.write().await = self.wavelength_log.len();

        debug!(
            points = self.wavelength_log.len(),
            duration_secs, "MockLaser: sweep complete"
        );
        // Timing realism without slowing tests down.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(())
    }

    async fn wavelength_log(&mut self) -> Result<Vec<f64>> {
        Ok(self.wavelength_log.clone())
    }
}
