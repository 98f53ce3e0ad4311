use crate::bounds::{BoundSpec, Direction};

/// A linear programming problem as handed to a solving engine
///
/// Rows and columns are numbered from 1, the same as on the model side.
/// `objective[j - 1]` is the coefficient of column `j`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpProblem {
    /// Whether to minimize or maximize
    pub direction: Direction,
    /// Constant term of the objective function
    pub shift: f64,
    /// Objective coefficient of each column
    pub objective: Vec<f64>,
    /// Bound of each row (auxiliary variable)
    pub row_bounds: Vec<BoundSpec>,
    /// Bound of each column (structural variable)
    pub column_bounds: Vec<BoundSpec>,
    /// Non-zero constraint coefficients
    pub entries: Vec<MatrixEntry>,
}

/// One `(row, column, value)` triple of the sparse constraint matrix
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixEntry {
    pub row: usize,
    pub column: usize,
    pub value: f64,
}

impl LpProblem {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Append a column and return its 1-based index
    pub fn add_column(&mut self, bounds: BoundSpec, coefficient: f64) -> usize {
        self.column_bounds.push(bounds);
        self.objective.push(coefficient);
        self.column_bounds.len()
    }

    /// Append a row and return its 1-based index
    pub fn add_row(&mut self, bounds: BoundSpec) -> usize {
        self.row_bounds.push(bounds);
        self.row_bounds.len()
    }

    pub fn add_entry(&mut self, row: usize, column: usize, value: f64) {
        self.entries.push(MatrixEntry { row, column, value });
    }

    pub fn num_columns(&self) -> usize {
        self.column_bounds.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_bounds.len()
    }

    /// Dense copy of the constraint matrix, zero-based, one `Vec` per row.
    ///
    /// Entries that point outside the problem are skipped; repeated entries
    /// for the same cell are summed.
    pub fn dense_rows(&self) -> Vec<Vec<f64>> {
        let n_cols = self.num_columns();
        let mut rows = vec![vec![0.0; n_cols]; self.num_rows()];
        for entry in &self.entries {
            let inside = (1..=rows.len()).contains(&entry.row)
                && (1..=n_cols).contains(&entry.column);
            if !inside {
                continue;
            }
            rows[entry.row - 1][entry.column - 1] += entry.value;
        }
        rows
    }

    /// Objective value at `values`, shift included
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.shift
            + self
                .objective
                .iter()
                .zip(values)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    /// Whether every number in the problem is usable by a numerical engine
    pub(crate) fn is_well_formed(&self) -> bool {
        self.shift.is_finite()
            && self.objective.iter().all(|c| c.is_finite())
            && self.entries.iter().all(|e| e.value.is_finite())
            && !self.row_bounds.iter().any(BoundSpec::has_nan)
            && !self.column_bounds.iter().any(BoundSpec::has_nan)
    }
}
