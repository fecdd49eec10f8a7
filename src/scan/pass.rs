//! Scan pass parameters and outcomes.

use crate::core::Position;
use crate::error::{BenchError, BenchResult};
use crate::scan::BestReading;
use serde::{Deserialize, Serialize};

/// Relative tolerance for span/step divisibility after floating-point
/// division.
const DIVISIBILITY_TOL: f64 = 1e-6;

/// Parameters of one raster pass: per-axis sweep span and grid spacing, in
/// stage-native units.
///
/// The scan region is derived, never stored: it is centered on the stage's
/// position at pass start, extends `x_span` along the row axis and `y_span`
/// along the column axis, and is sampled every `x_step`/`y_step`. Spans and
/// steps are independent per axis so non-square search regions are not
/// silently distorted; [`ScanPass::square`] covers the common case of one
/// pair for both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanPass {
    /// Total sweep span along the row (x) axis.
    pub x_span: f64,
    /// Total sweep span along the column (y) axis.
    pub y_span: f64,
    /// Grid spacing along the row (x) axis.
    pub x_step: f64,
    /// Grid spacing along the column (y) axis.
    pub y_step: f64,
}

impl ScanPass {
    /// A square region: the same span and step on both axes.
    pub fn square(sweep_distance: f64, step_size: f64) -> Self {
        Self {
            x_span: sweep_distance,
            y_span: sweep_distance,
            x_step: step_size,
            y_step: step_size,
        }
    }

    /// A rectangular region with independent per-axis span and step.
    pub fn rect(x_span: f64, x_step: f64, y_span: f64, y_step: f64) -> Self {
        Self {
            x_span,
            y_span,
            x_step,
            y_step,
        }
    }

    /// Validate the pass and return the grid shape as `(rows, cols)`.
    ///
    /// Rows count cells along the row (x) axis, columns along the column (y)
    /// axis. Fails with [`BenchError::InvalidScanParameters`] if a span or
    /// step is non-positive, or if a step does not divide its span to within
    /// rounding tolerance.
    pub fn grid_shape(&self) -> BenchResult<(usize, usize)> {
        let rows = edge_count("x", self.x_span, self.x_step)?;
        let cols = edge_count("y", self.y_span, self.y_step)?;
        Ok((rows, cols))
    }
}

fn edge_count(axis: &'static str, span: f64, step: f64) -> BenchResult<usize> {
    if !(span > 0.0) || !(step > 0.0) {
        return Err(BenchError::InvalidScanParameters {
            axis,
            span,
            step,
            reason: "span and step must be positive".to_string(),
        });
    }

    let ratio = span / step;
    let count = ratio.round();
    if count < 1.0 {
        return Err(BenchError::InvalidScanParameters {
            axis,
            span,
            step,
            reason: "step is larger than twice the span".to_string(),
        });
    }
    if (ratio - count).abs() > DIVISIBILITY_TOL * count {
        return Err(BenchError::InvalidScanParameters {
            axis,
            span,
            step,
            reason: "step does not evenly divide span".to_string(),
        });
    }

    Ok(count as usize)
}

/// Result of one raster pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassOutcome {
    /// Scan origin the pass started from (center minus half span per axis).
    pub origin: Position,
    /// Best reading found, or `None` if no finite reading was taken. The
    /// stage is parked at the best position, or at `origin` when `None`.
    pub best: Option<BestReading>,
}

impl PassOutcome {
    /// Where the stage was parked when the pass returned.
    pub fn parked(&self) -> Position {
        match self.best {
            Some(b) => b.position,
            None => self.origin,
        }
    }
}
