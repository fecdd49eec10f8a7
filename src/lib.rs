//! Core library for the picbench application.
//!
//! This library contains the capability traits, alignment-scan core, and
//! experiment orchestration for automating photonic-chip test benches. It is
//! used by the `picbench` CLI and by integration tests running against mock
//! hardware.

pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod experiment;
pub mod instrument;
pub mod scan;
pub mod storage;
