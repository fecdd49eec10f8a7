//! Core traits and data types for the bench automation system.
//!
//! This module defines the foundational abstractions for the test bench,
//! providing capability traits for the instruments the bench coordinates:
//! a motorized stage, a scalar detector, an oscilloscope, and a tunable laser.
//!
//! # Architecture Overview
//!
//! Capability-based traits at the hardware seam:
//!
//! - [`Instrument`]: Base trait with lifecycle management
//! - [`Stage`], [`Detector`], [`Oscilloscope`], [`TunableLaser`]: capability
//!   traits for specific functionality
//!
//! Bench logic (alignment scans, sweep experiments) is written against these
//! traits, never against concrete drivers, so it runs unchanged on mock
//! hardware in tests.
//!
//! # Concurrency
//!
//! All traits require `Send + Sync` for use in async tasks, but the bench
//! itself is strictly sequential: every stage move, settle delay, and
//! detector read runs to completion before the next begins. The physical
//! hardware cannot be queried faster than it settles, so pipelining would
//! only risk reading stale values during motion.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Basic Data Types
// =============================================================================

/// A controlled stage axis.
///
/// The bench addresses two orthogonal linear axes; chip-rotation axes exist
/// on some stages but are not part of the scan paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Row axis of a raster scan.
    X,
    /// Column axis of a raster scan.
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Direction of a relative jog step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDirection {
    /// Step in the axis-positive direction.
    Forward,
    /// Step in the axis-negative direction.
    Backward,
}

/// A stage position in stage-native units.
///
/// Mutable only through the [`Stage`] move operations; read back via
/// [`Stage::position`]. Positions must be read immediately before use, not
/// cached, because manual jogs or mechanical backlash can shift the actual
/// position independent of the commanded one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Row-axis coordinate.
    pub x: f64,
    /// Column-axis coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from per-axis coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

/// A captured oscilloscope waveform: raw samples at a fixed sample rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Channel the waveform was captured on.
    pub channel: u8,
    /// Sample rate in samples per second.
    pub sample_rate: f64,
    /// Raw voltage samples.
    pub samples: Vec<f64>,
}

impl Waveform {
    /// Duration covered by the samples, in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

/// Per-channel vertical settings for the oscilloscope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Full-scale vertical range in volts.
    pub range: f64,
    /// Vertical offset in divisions.
    pub position: f64,
}

/// Laser sweep-mode configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepMode {
    /// Continuous sweep (vs. stepped).
    pub continuous: bool,
    /// Sweep both directions.
    pub twoway: bool,
}

impl Default for SweepMode {
    fn default() -> Self {
        Self {
            continuous: true,
            twoway: true,
        }
    }
}

// =============================================================================
// Core Instrument Trait
// =============================================================================

/// Base trait for all instruments.
///
/// Establishes the hardware connection lifecycle. Capability traits
/// ([`Stage`], [`Detector`], ...) extend this with domain methods.
#[async_trait]
pub trait Instrument: Send + Sync {
    /// Unique instrument identifier (e.g. "stage", "scope", "laser").
    fn id(&self) -> &str;

    /// Initialize hardware connection.
    ///
    /// Called once before the instrument can be used. Should establish the
    /// connection, verify communication, and prepare for operation.
    async fn initialize(&mut self) -> Result<()>;

    /// Shutdown hardware connection gracefully.
    async fn shutdown(&mut self) -> Result<()>;
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Motorized XY stage capability.
///
/// Alignment logic works against this trait for hardware-agnostic
/// positioning. Absolute moves block until motion completes; relative steps
/// either block or the caller adds the settle delay.
#[async_trait]
pub trait Stage: Instrument {
    /// Current position of one axis, in stage-native units.
    async fn position(&self, axis: Axis) -> Result<f64>;

    /// Move both axes to an absolute position. Blocks until motion completes.
    async fn move_to(&mut self, target: Position) -> Result<()>;

    /// Currently configured jog increment, in stage-native units.
    async fn jog_step(&self) -> Result<f64>;

    /// Set the jog increment used by [`Stage::step`].
    async fn set_jog_step(&mut self, size: f64) -> Result<()>;

    /// Advance one axis by the configured jog increment.
    async fn step(&mut self, axis: Axis, direction: StepDirection) -> Result<()>;

    /// Current position of both axes.
    async fn xy(&self) -> Result<Position> {
        Ok(Position::new(
            self.position(Axis::X).await?,
            self.position(Axis::Y).await?,
        ))
    }
}

/// Scalar-detector capability: one synchronous reading of optical coupling.
///
/// On the physical bench this is the oscilloscope's auto-measurement of a
/// photodetector channel; any instrument that can report a single scalar
/// works for alignment.
#[async_trait]
pub trait Detector: Instrument {
    /// Take one detector reading.
    async fn measure(&mut self) -> Result<f64>;
}

/// Oscilloscope capability: triggered multi-channel waveform acquisition.
#[async_trait]
pub trait Oscilloscope: Instrument {
    /// Configure sample rate (Sa/s) and total acquisition time (s).
    async fn configure_acquisition(&mut self, sample_rate: f64, duration_secs: f64) -> Result<()>;

    /// Configure one channel's vertical settings.
    async fn configure_channel(&mut self, channel: u8, settings: ChannelSettings) -> Result<()>;

    /// Arm an edge trigger on a channel at the given level in volts.
    async fn set_edge_trigger(&mut self, channel: u8, level_volts: f64) -> Result<()>;

    /// Start a single triggered acquisition. Returns immediately.
    async fn start_acquisition(&mut self) -> Result<()>;

    /// Block until the armed acquisition completes or the timeout elapses.
    async fn wait_for_acquisition(&mut self, timeout: std::time::Duration) -> Result<()>;

    /// Fetch the captured waveform for one channel.
    async fn waveform(&mut self, channel: u8) -> Result<Waveform>;
}

/// Tunable-laser capability with sweep and trigger-output control.
#[async_trait]
pub trait TunableLaser: Instrument {
    /// Lowest wavelength the laser can emit, in nanometers.
    fn min_wavelength_nm(&self) -> f64;

    /// Highest wavelength the laser can emit, in nanometers.
    fn max_wavelength_nm(&self) -> f64;

    /// Set output power in dBm.
    async fn set_power_dbm(&mut self, power: f64) -> Result<()>;

    /// Open the output shutter (allow emission).
    async fn open_shutter(&mut self) -> Result<()>;

    /// Close the output shutter (block emission).
    async fn close_shutter(&mut self) -> Result<()>;

    /// Configure the sweep mode.
    async fn set_sweep_mode(&mut self, mode: SweepMode) -> Result<()>;

    /// Enable the trigger output, firing one pulse every `step_nm` of sweep
    /// travel. Synchronizes the oscilloscope capture to the sweep.
    async fn enable_step_trigger(&mut self, step_nm: f64) -> Result<()>;

    /// Sweep from `start_nm` to `stop_nm` over `duration_secs`. Blocks until
    /// the sweep completes.
    async fn sweep(&mut self, start_nm: f64, stop_nm: f64, duration_secs: f64) -> Result<()>;

    /// Wavelengths (nm) the laser logged at each trigger pulse during the
    /// last sweep.
    async fn wavelength_log(&mut self) -> Result<Vec<f64>>;
}
