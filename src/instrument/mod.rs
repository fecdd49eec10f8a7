//! Instrument implementations.
//!
//! Real bench hardware (the motion controller, oscilloscope, and tunable
//! laser) lives behind vendor drivers outside this crate; bench logic only
//! sees the capability traits in [`crate::core`]. This module provides mock
//! implementations for tests and headless demo runs without physical
//! devices.

pub mod mock;

pub use mock::{MockDetector, MockLaser, MockScope, MockStage};
