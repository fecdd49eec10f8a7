//! Sample grid for one scan pass.

/// 2-D array of detector readings, one per visited grid cell, indexed by
/// `(row, col)` in row-major order.
///
/// Scoped to a single pass: the scanner fills it as cells are visited and
/// hands snapshots to the live observer; it is discarded when the pass
/// completes. Unvisited cells read as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl SampleGrid {
    /// Create a zero-filled grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reading at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Store a reading at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Row-major view of all readings.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_roundtrip() {
        let mut grid = SampleGrid::new(2, 3);
        grid.set(0, 0, 1.0);
        grid.set(1, 2, 4.5);
        assert_eq!(grid.get(0, 0), 1.0);
        assert_eq!(grid.get(1, 2), 4.5);
        assert_eq!(grid.get(0, 1), 0.0);
        assert_eq!(grid.as_slice().len(), 6);
    }

    #[test]
    fn test_row_major_layout() {
        let mut grid = SampleGrid::new(2, 2);
        grid.set(0, 1, 1.0);
        grid.set(1, 0, 2.0);
        assert_eq!(grid.as_slice(), &[0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_panics() {
        let grid = SampleGrid::new(2, 2);
        let _ = grid.get(2, 0);
    }
}
