//! Custom error types for the application.
//!
//! This module defines the primary error type, `BenchError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle different kinds of errors, from configuration and
//! I/O issues to instrument-specific problems.
//!
//! ## Error Hierarchy
//!
//! `BenchError` is an enum that consolidates various error sources:
//!
//! - **`Config`**: Wraps errors from `figment`, typically related to file
//!   parsing or missing keys in the configuration files.
//! - **`Configuration`**: Represents semantic errors in the configuration,
//!   values that parse fine but are logically incorrect (e.g. an unknown log
//!   level). These are caught during the validation step.
//! - **`InvalidScanParameters`**: Raised before a scan starts when a step
//!   size does not evenly (within rounding tolerance) divide its sweep span,
//!   or when either is non-positive.
//! - **`DriverUnavailable`**: Surfaced, not retried, when the stage or
//!   detector fails to respond to a command. The scan aborts in place,
//!   leaving the stage at its last commanded position.
//! - **`Instrument`**: General category for errors originating from
//!   instrument drivers.
//! - **`Sweep`**: Errors in wavelength-sweep orchestration, e.g. a sweep
//!   rate outside the laser's supported range.
//! - **`Io`**: Wraps standard `std::io::Error` for data-file writing.
//!
//! By using `#[from]`, `BenchError` can be seamlessly created from underlying
//! error types, simplifying error handling with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Primary error type for the bench automation library.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration file could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration loaded but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Scan parameters rejected before any stage motion.
    #[error(
        "Invalid scan parameters: span {span} with step {step} on the {axis} axis ({reason})"
    )]
    InvalidScanParameters {
        /// Axis the offending pair was given for.
        axis: &'static str,
        /// Requested sweep span in stage units.
        span: f64,
        /// Requested grid spacing in stage units.
        step: f64,
        /// Why the pair was rejected.
        reason: String,
    },

    /// A driver stopped responding mid-operation. Not retried at this layer.
    #[error("Driver '{driver}' unavailable: {message}")]
    DriverUnavailable {
        /// Identifier of the failing driver.
        driver: String,
        /// Underlying failure description.
        message: String,
    },

    /// Instrument-level error (bad command, out-of-range setting, ...).
    #[error("Instrument error: {0}")]
    Instrument(String),

    /// Wavelength-sweep orchestration error.
    #[error("Sweep error: {0}")]
    Sweep(String),

    /// I/O error while persisting data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
