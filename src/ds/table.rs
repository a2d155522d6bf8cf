use crate::error::{Error, IndexKind, Result};

/// A dense `rows × cols` table of `f64` values stored in row-major order
///
/// The shape is fixed at construction and every cell always holds a value.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl QTable {
    /// Construct a zero-filled table, callers validate that both dimensions are non-zero
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        debug_assert!(rows > 0 && cols > 0, "table dimensions must be non-zero");
        Self {
            values: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Construct a table from row-major values, returning `None` unless `values.len() == rows * cols`
    /// and both dimensions are non-zero
    pub fn from_values(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        let len = rows.checked_mul(cols)?;
        (rows > 0 && cols > 0 && values.len() == len).then_some(Self { values, rows, cols })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get a view of a single row
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        self.check_row(row, IndexKind::State)?;
        let start = row * self.cols;
        Ok(&self.values[start..start + self.cols])
    }

    /// Get the value stored at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_row(row, IndexKind::State)?;
        self.check_col(col)?;
        Ok(self.values[row * self.cols + col])
    }

    /// Add `delta` to the value at `(row, col)` and return the new value
    pub fn update(&mut self, row: usize, col: usize, delta: f64) -> Result<f64> {
        self.check_row(row, IndexKind::State)?;
        self.check_col(col)?;
        let cell = &mut self.values[row * self.cols + col];
        *cell += delta;
        Ok(*cell)
    }

    /// Largest value in a row
    pub fn max_in_row(&self, row: usize) -> Result<f64> {
        let row = self.row(row)?;
        Ok(row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Column index of the largest value in a row, ties resolved to the lowest index
    pub fn argmax_in_row(&self, row: usize) -> Result<usize> {
        let row = self.row(row)?;
        Ok(first_max(row))
    }

    pub(crate) fn check_row(&self, row: usize, kind: IndexKind) -> Result<()> {
        if row < self.rows {
            Ok(())
        } else {
            Err(Error::out_of_range(kind, row, self.rows))
        }
    }

    pub(crate) fn check_col(&self, col: usize) -> Result<()> {
        if col < self.cols {
            Ok(())
        } else {
            Err(Error::out_of_range(IndexKind::Action, col, self.cols))
        }
    }
}

/// Index of the first maximum, only a strictly greater value replaces the current best
fn first_max(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_ix, best), (ix, &v)| {
            if v > best {
                (ix, v)
            } else {
                (best_ix, best)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_functional() {
        let table = QTable::zeros(3, 2);
        assert_eq!(table.shape(), (3, 2), "shape correct");
        assert_eq!(table.values(), [0.0; 6], "zero filled");
        assert_eq!(table.row(2).unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn update_is_row_major() {
        let mut table = QTable::zeros(2, 3);
        assert_eq!(table.update(1, 2, 1.5).unwrap(), 1.5);
        assert_eq!(table.update(1, 2, -0.5).unwrap(), 1.0, "delta is added");
        assert_eq!(table.values(), [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(table.get(1, 2).unwrap(), 1.0);
    }

    #[test]
    fn argmax_takes_first_of_ties() {
        let table = QTable::from_values(2, 4, vec![0.0, 3.0, 1.0, 3.0, -2.0, -1.0, -1.0, -5.0]).unwrap();
        assert_eq!(table.argmax_in_row(0).unwrap(), 1, "lowest index among ties");
        assert_eq!(table.argmax_in_row(1).unwrap(), 1, "works with negative values");
        assert_eq!(table.max_in_row(1).unwrap(), -1.0);
        assert_eq!(QTable::zeros(1, 5).argmax_in_row(0).unwrap(), 0, "all zeros picks 0");
    }

    #[test]
    fn bounds_checked() {
        let mut table = QTable::zeros(2, 2);
        assert!(matches!(
            table.get(2, 0),
            Err(Error::IndexOutOfRange { kind: IndexKind::State, index: 2, bound: 2 })
        ));
        assert!(matches!(
            table.update(0, 5, 1.0),
            Err(Error::IndexOutOfRange { kind: IndexKind::Action, index: 5, bound: 2 })
        ));
        assert!(table.row(7).is_err());
        assert_eq!(table.values(), [0.0; 4], "failed update leaves table untouched");
    }

    #[test]
    fn from_values_requires_rectangle() {
        assert!(QTable::from_values(2, 2, vec![1.0; 4]).is_some());
        assert!(QTable::from_values(2, 2, vec![1.0; 3]).is_none());
        assert!(QTable::from_values(0, 2, vec![]).is_none());
        assert!(QTable::from_values(usize::MAX, 2, vec![]).is_none(), "overflow rejected");
    }
}
