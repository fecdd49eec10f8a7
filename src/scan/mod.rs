//! Stage-alignment scanning.
//!
//! Finds, within a bounded neighborhood of the stage's current position, the
//! position that maximizes a scalar detector reading, and leaves the stage
//! parked there. The search is a serpentine raster over a grid centered on
//! the starting position; [`AlignmentScanner::run_coarse_to_fine`] chains
//! passes with shrinking span and step so a wide region can be searched
//! without paying a fine grid over the whole area (a single fine pass is
//! quadratic in span/step).
//!
//! Motion and measurement are strictly sequential: every stage move is
//! followed by a settle delay before the detector is read. Per-pass state is
//! the implicit Idle → Scanning(row, col, direction) → Idle progression; the
//! only state that survives a pass is the stage's physical position.

mod grid;
mod pass;

pub use grid::SampleGrid;
pub use pass::{PassOutcome, ScanPass};

use crate::core::{Axis, Detector, Position, Stage, StepDirection};
use crate::error::{BenchError, BenchResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serpentine traversal state for the column axis.
///
/// Explicit enum instead of a mutable "moving down" flag; toggled at row
/// boundaries so consecutive rows are walked in opposite directions, halving
/// the column-axis travel versus rewinding each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Columns visited low to high.
    Forward,
    /// Columns visited high to low.
    Backward,
}

impl Traversal {
    /// The opposite traversal direction.
    pub fn toggled(self) -> Self {
        match self {
            Traversal::Forward => Traversal::Backward,
            Traversal::Backward => Traversal::Forward,
        }
    }

    /// Jog direction corresponding to this traversal.
    pub fn step_direction(self) -> StepDirection {
        match self {
            Traversal::Forward => StepDirection::Forward,
            Traversal::Backward => StepDirection::Backward,
        }
    }
}

/// Maximum detector reading seen so far and the stage position it was read
/// at.
///
/// The position is captured by querying the stage immediately after the
/// maximizing measurement, never recomputed from grid indices: commanded and
/// actual position diverge under mechanical slop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestReading {
    /// Detector value.
    pub value: f64,
    /// Stage position at read time.
    pub position: Position,
}

/// Per-cell hook for live display of a scan in progress.
///
/// Purely observational: the scanner calls [`ScanObserver::cell_sampled`]
/// once per visited cell with a snapshot of the sample grid, and consumes no
/// return value. The callback runs inline with acquisition, so it must stay
/// cheap; pass `&mut ()` to skip observation entirely.
pub trait ScanObserver: Send {
    /// Called after each detector reading with the cell's grid coordinates,
    /// the reading, and the grid filled so far.
    fn cell_sampled(&mut self, row: usize, col: usize, value: f64, grid: &SampleGrid);
}

/// No-op observer.
impl ScanObserver for () {
    fn cell_sampled(&mut self, _row: usize, _col: usize, _value: f64, _grid: &SampleGrid) {}
}

/// Raster alignment scanner over a [`Stage`] and a [`Detector`].
///
/// The scanner borrows both drivers for the duration of a scan; there is
/// exactly one controller at a time, so no locking is involved.
pub struct AlignmentScanner<'a, S: Stage + ?Sized, D: Detector + ?Sized> {
    stage: &'a mut S,
    detector: &'a mut D,
    settle: Duration,
}

impl<'a, S: Stage + ?Sized, D: Detector + ?Sized> AlignmentScanner<'a, S, D> {
    /// Create a scanner with the given settle delay, applied after every
    /// stage motion before the next detector read.
    pub fn new(stage: &'a mut S, detector: &'a mut D, settle: Duration) -> Self {
        Self {
            stage,
            detector,
            settle,
        }
    }

    /// Run a single raster pass without live observation.
    ///
    /// See [`AlignmentScanner::run_single_pass_with`].
    pub async fn run_single_pass(&mut self, pass: &ScanPass) -> BenchResult<PassOutcome> {
        self.run_single_pass_with(pass, &mut ()).await
    }

    /// Run a single serpentine raster pass over a grid centered on the
    /// stage's current position.
    ///
    /// For an R×C grid this issues exactly R·C detector reads, R·C−1
    /// column-axis steps and R−1 row-axis steps: every cell's reading is
    /// followed by a column step, including each row's last cell, except the
    /// raster's final cell. The end-of-row step leaves the stage one
    /// increment past the row's extent, so alternate rows sample positions
    /// offset by one increment. The column direction alternates every row,
    /// starting forward on row 0. On return the stage is parked at the
    /// best-found position, or back at the scan origin if no finite reading
    /// was taken ([`PassOutcome::best`] is `None` then — callers must check
    /// rather than assume a meaningful maximum).
    ///
    /// The stage's jog increment is saved on entry and restored before
    /// parking. A driver failure aborts the scan in place: the stage is left
    /// at its last commanded position and the jog increment is not restored.
    pub async fn run_single_pass_with(
        &mut self,
        pass: &ScanPass,
        observer: &mut dyn ScanObserver,
    ) -> BenchResult<PassOutcome> {
        let (rows, cols) = pass.grid_shape()?;

        let start = stage_op(self.stage.xy().await)?;
        let origin = Position::new(
            start.x - pass.x_span / 2.0,
            start.y - pass.y_span / 2.0,
        );
        debug!(%start, %origin, rows, cols, "starting raster pass");

        stage_op(self.stage.move_to(origin).await)?;
        self.settle().await;

        let saved_jog = stage_op(self.stage.jog_step().await)?;
        let mut current_jog = None;

        let mut grid = SampleGrid::new(rows, cols);
        let mut best: Option<BestReading> = None;
        let mut traversal = Traversal::Forward;

        for row in 0..rows {
            for col in 0..cols {
                let value = detector_op(self.detector.measure().await)?;
                // Loop order follows the serpentine; the grid stays spatial.
                let grid_col = match traversal {
                    Traversal::Forward => col,
                    Traversal::Backward => cols - 1 - col,
                };
                grid.set(row, grid_col, value);

                let improved = value.is_finite()
                    && best.map_or(true, |b| value > b.value);
                if improved {
                    let position = stage_op(self.stage.xy().await)?;
                    best = Some(BestReading { value, position });
                }

                observer.cell_sampled(row, grid_col, value, &grid);

                // Column step after every cell, end-of-row included; only
                // the raster's final cell skips it.
                let last_cell = row + 1 == rows && col + 1 == cols;
                if !last_cell {
                    self.set_jog(&mut current_jog, pass.y_step).await?;
                    stage_op(self.stage.step(Axis::Y, traversal.step_direction()).await)?;
                    self.settle().await;
                }
            }

            if row + 1 < rows {
                traversal = traversal.toggled();
                self.set_jog(&mut current_jog, pass.x_step).await?;
                stage_op(self.stage.step(Axis::X, StepDirection::Forward).await)?;
                self.settle().await;
            }
        }

        stage_op(self.stage.set_jog_step(saved_jog).await)?;

        // Park at the best reading, not at the raster's terminal cell.
        match best {
            Some(b) => {
                info!(value = b.value, position = %b.position, "pass complete");
                stage_op(self.stage.move_to(b.position).await)?;
            }
            None => {
                warn!("no finite detector reading during pass, returning to scan origin");
                stage_op(self.stage.move_to(origin).await)?;
            }
        }
        self.settle().await;

        Ok(PassOutcome { origin, best })
    }

    /// Run a sequence of passes, coarsest first.
    ///
    /// Each pass's region is centered on the previous pass's best position,
    /// implicitly: the previous pass leaves the stage parked there. Returns
    /// the final pass's outcome.
    pub async fn run_coarse_to_fine(&mut self, passes: &[ScanPass]) -> BenchResult<PassOutcome> {
        self.run_coarse_to_fine_with(passes, &mut ()).await
    }

    /// [`AlignmentScanner::run_coarse_to_fine`] with a live observer shared
    /// across all passes.
    pub async fn run_coarse_to_fine_with(
        &mut self,
        passes: &[ScanPass],
        observer: &mut dyn ScanObserver,
    ) -> BenchResult<PassOutcome> {
        let (first, rest) = passes.split_first().ok_or_else(|| {
            BenchError::Configuration("coarse-to-fine schedule contains no passes".to_string())
        })?;

        info!(pass = 1, total = passes.len(), "coarse-to-fine pass");
        let mut outcome = self.run_single_pass_with(first, observer).await?;
        for (i, pass) in rest.iter().enumerate() {
            info!(pass = i + 2, total = passes.len(), "coarse-to-fine pass");
            outcome = self.run_single_pass_with(pass, observer).await?;
        }
        Ok(outcome)
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }

    async fn set_jog(&mut self, current: &mut Option<f64>, size: f64) -> BenchResult<()> {
        if *current != Some(size) {
            stage_op(self.stage.set_jog_step(size).await)?;
            *current = Some(size);
        }
        Ok(())
    }
}

fn stage_op<T>(res: anyhow::Result<T>) -> BenchResult<T> {
    res.map_err(|e| BenchError::DriverUnavailable {
        driver: "stage".to_string(),
        message: format!("{e:#}"),
    })
}

fn detector_op<T>(res: anyhow::Result<T>) -> BenchResult<T> {
    res.map_err(|e| BenchError::DriverUnavailable {
        driver: "detector".to_string(),
        message: format!("{e:#}"),
    })
}
