use std::collections::BTreeMap;

use lpkit_solver::{
    BoundSpec, BoundType, Direction, LpProblem, Solution, SolveFailure, Solver, SolvingEngine,
};
use tracing::{debug, trace};

use crate::error::{Axis, ModelError};

/// Longest name, in characters, a problem, row or column may carry
pub const MAX_NAME_LEN: usize = 255;

/// A constraint, seen as an auxiliary variable with bounds
#[derive(Debug, Clone, Default)]
struct Row {
    name: Option<String>,
    bounds: BoundSpec,
}

/// A structural variable
#[derive(Debug, Clone)]
struct Column {
    name: Option<String>,
    bounds: BoundSpec,
    /// Objective coefficient
    coefficient: f64,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            name: None,
            bounds: BoundSpec::Fixed(0.0),
            coefficient: 0.0,
        }
    }
}

/// An LP problem built up incrementally and solved by a [`SolvingEngine`].
///
/// Rows and columns are numbered from 1 in the order they were added and keep
/// their numbers for the lifetime of the problem (until [`reset`]). New rows
/// start free, new columns start fixed at zero.
///
/// Every mutation that can change the optimum discards the cached solution,
/// so `objective_value` and `primal_value` only ever report the result of a
/// solve of the problem as it currently stands.
///
/// [`reset`]: ProblemModel::reset
#[derive(Debug)]
pub struct ProblemModel<E = Solver> {
    name: Option<String>,
    direction: Direction,
    /// Constant term of the objective
    shift: f64,
    rows: Vec<Row>,
    columns: Vec<Column>,
    /// Non-zero coefficients keyed by 1-based `(row, column)`
    matrix: BTreeMap<(usize, usize), f64>,
    solution: Option<Solution>,
    /// Rows were added since the engine last solved
    factorization_stale: bool,
    engine: E,
}

impl ProblemModel<Solver> {
    /// An unnamed, empty minimization problem using the bundled simplex engine
    pub fn new() -> Self {
        Self::with_engine(Solver::new())
    }

    pub fn create(name: Option<&str>, direction: Direction) -> Result<Self, ModelError> {
        let mut model = Self::new();
        model.set_name(name)?;
        model.direction = direction;
        Ok(model)
    }
}

impl Default for ProblemModel<Solver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SolvingEngine> ProblemModel<E> {
    /// An unnamed, empty minimization problem solved by `engine`
    pub fn with_engine(engine: E) -> Self {
        Self {
            name: None,
            direction: Direction::Minimize,
            shift: 0.0,
            rows: Vec::new(),
            columns: Vec::new(),
            matrix: BTreeMap::new(),
            solution: None,
            factorization_stale: false,
            engine,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the problem name; `None` or `""` erases it
    pub fn set_name(&mut self, name: Option<&str>) -> Result<(), ModelError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if self.direction != direction {
            self.direction = direction;
            self.invalidate();
        }
    }

    /// Erase the whole problem. The direction is kept and the model stays usable.
    pub fn reset(&mut self) {
        trace!(
            component = "model",
            operation = "reset",
            rows = self.rows.len() as u64,
            columns = self.columns.len() as u64,
            "Erasing problem"
        );
        self.name = None;
        self.shift = 0.0;
        self.rows.clear();
        self.columns.clear();
        self.matrix.clear();
        self.solution = None;
        self.factorization_stale = true;
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Append `amount` free rows and return the number of the first one.
    ///
    /// With `amount == 0` nothing changes and the number the next row would
    /// get is returned.
    pub fn add_rows(&mut self, amount: usize) -> usize {
        let first = self.rows.len() + 1;
        if amount == 0 {
            return first;
        }
        self.rows.resize_with(self.rows.len() + amount, Row::default);
        self.factorization_stale = true;
        self.invalidate();
        trace!(
            component = "model",
            operation = "add_rows",
            first = first as u64,
            amount = amount as u64
        );
        first
    }

    /// Append `amount` columns fixed at zero and return the number of the first one.
    pub fn add_columns(&mut self, amount: usize) -> usize {
        let first = self.columns.len() + 1;
        if amount == 0 {
            return first;
        }
        self.columns.resize_with(self.columns.len() + amount, Column::default);
        self.invalidate();
        trace!(
            component = "model",
            operation = "add_columns",
            first = first as u64,
            amount = amount as u64
        );
        first
    }

    /// Add one named, bounded row. Nothing is added if the name or bound is rejected.
    pub fn add_row_with_bound(
        &mut self,
        name: Option<&str>,
        kind: BoundType,
        lower: f64,
        upper: f64,
    ) -> Result<usize, ModelError> {
        let name = validate_name(name)?;
        let bounds = validate_bound(kind, lower, upper)?;
        let i = self.add_rows(1);
        self.rows[i - 1] = Row { name, bounds };
        Ok(i)
    }

    /// Add one named, bounded column with its objective coefficient.
    pub fn add_column_with_bound(
        &mut self,
        name: Option<&str>,
        kind: BoundType,
        lower: f64,
        upper: f64,
        coefficient: f64,
    ) -> Result<usize, ModelError> {
        let name = validate_name(name)?;
        let bounds = validate_bound(kind, lower, upper)?;
        let j = self.add_columns(1);
        self.columns[j - 1] = Column { name, bounds, coefficient };
        Ok(j)
    }

    pub fn row_name(&self, i: usize) -> Result<Option<&str>, ModelError> {
        let pos = self.row_pos(i)?;
        Ok(self.rows[pos].name.as_deref())
    }

    pub fn column_name(&self, j: usize) -> Result<Option<&str>, ModelError> {
        let pos = self.column_pos(j)?;
        Ok(self.columns[pos].name.as_deref())
    }

    /// Name row `i`; `None` or `""` erases its current name
    pub fn set_row_name(&mut self, i: usize, name: Option<&str>) -> Result<(), ModelError> {
        let pos = self.row_pos(i)?;
        self.rows[pos].name = validate_name(name)?;
        Ok(())
    }

    /// Name column `j`; `None` or `""` erases its current name
    pub fn set_column_name(&mut self, j: usize, name: Option<&str>) -> Result<(), ModelError> {
        let pos = self.column_pos(j)?;
        self.columns[pos].name = validate_name(name)?;
        Ok(())
    }

    /// First row (by number) named `name`
    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.name.as_deref() == Some(name))
            .map(|pos| pos + 1)
    }

    /// First column (by number) named `name`
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
            .map(|pos| pos + 1)
    }

    pub fn row_bound(&self, i: usize) -> Result<BoundSpec, ModelError> {
        let pos = self.row_pos(i)?;
        Ok(self.rows[pos].bounds)
    }

    pub fn column_bound(&self, j: usize) -> Result<BoundSpec, ModelError> {
        let pos = self.column_pos(j)?;
        Ok(self.columns[pos].bounds)
    }

    /// Replace the bound of row `i`.
    ///
    /// `Free` ignores both values, `Fixed` takes its value from `lower`.
    pub fn set_row_bound(
        &mut self,
        i: usize,
        kind: BoundType,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        let pos = self.row_pos(i)?;
        self.rows[pos].bounds = validate_bound(kind, lower, upper)?;
        self.invalidate();
        Ok(())
    }

    /// Replace the bound of column `j`; same conventions as [`set_row_bound`].
    ///
    /// [`set_row_bound`]: ProblemModel::set_row_bound
    pub fn set_column_bound(
        &mut self,
        j: usize,
        kind: BoundType,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        let pos = self.column_pos(j)?;
        self.columns[pos].bounds = validate_bound(kind, lower, upper)?;
        self.invalidate();
        Ok(())
    }

    /// Objective coefficient of column `j`; column 0 is the constant shift
    pub fn coefficient(&self, j: usize) -> Result<f64, ModelError> {
        if j == 0 {
            return Ok(self.shift);
        }
        let pos = self.column_pos(j)?;
        Ok(self.columns[pos].coefficient)
    }

    /// Set the objective coefficient of column `j`; column 0 sets the constant shift
    pub fn set_coefficient(&mut self, j: usize, value: f64) -> Result<(), ModelError> {
        if j == 0 {
            self.shift = value;
        } else {
            let pos = self.column_pos(j)?;
            self.columns[pos].coefficient = value;
        }
        self.invalidate();
        Ok(())
    }

    pub fn matrix_coefficient(&self, i: usize, j: usize) -> Result<f64, ModelError> {
        self.row_pos(i)?;
        self.column_pos(j)?;
        Ok(self.matrix.get(&(i, j)).copied().unwrap_or(0.0))
    }

    /// Set a single constraint coefficient; zero removes the entry
    pub fn set_matrix_coefficient(
        &mut self,
        i: usize,
        j: usize,
        value: f64,
    ) -> Result<(), ModelError> {
        self.row_pos(i)?;
        self.column_pos(j)?;
        self.store_cell(i, j, value);
        self.invalidate();
        Ok(())
    }

    /// Overwrite the top-left block of the constraint matrix, row by row.
    ///
    /// `matrix[r][c]` becomes the coefficient of row `r + 1`, column `c + 1`.
    /// Cells outside the block keep their coefficients. The block may not be
    /// taller than the row count or wider than the column count; if it is,
    /// nothing is written.
    pub fn load_matrix_by_row<R: AsRef<[f64]>>(&mut self, matrix: &[R]) -> Result<(), ModelError> {
        if matrix.len() > self.rows.len() {
            return Err(ModelError::DimensionMismatch {
                axis: Axis::Row,
                supplied: matrix.len(),
                available: self.rows.len(),
            });
        }
        let widest = matrix.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        if widest > self.columns.len() {
            return Err(ModelError::DimensionMismatch {
                axis: Axis::Column,
                supplied: widest,
                available: self.columns.len(),
            });
        }

        let mut written = 0usize;
        for (r, values) in matrix.iter().enumerate() {
            for (c, &value) in values.as_ref().iter().enumerate() {
                self.store_cell(r + 1, c + 1, value);
                written += 1;
            }
        }

        if written > 0 {
            self.invalidate();
        }
        trace!(
            component = "model",
            operation = "load_matrix_by_row",
            rows = matrix.len() as u64,
            cells = written as u64,
            nnz = self.matrix.len() as u64
        );
        Ok(())
    }

    /// The problem as it would be handed to the engine
    pub fn to_lp_problem(&self) -> LpProblem {
        let mut problem = LpProblem::new(self.direction);
        problem.shift = self.shift;
        for column in &self.columns {
            problem.add_column(column.bounds, column.coefficient);
        }
        for row in &self.rows {
            problem.add_row(row.bounds);
        }
        for (&(i, j), &value) in &self.matrix {
            problem.add_entry(i, j, value);
        }
        problem
    }

    /// Hand the problem to the engine and keep the solution it returns.
    ///
    /// The previous solution is dropped before the engine runs, so after a
    /// failed solve no values are readable until the next successful one.
    pub fn solve(&mut self) -> Result<(), ModelError> {
        self.solution = None;
        if self.factorization_stale {
            self.engine.discard_factorization();
            self.factorization_stale = false;
        }

        let problem = self.to_lp_problem();
        let solution = self.engine.solve(&problem);

        if let Some(failure) = solution.status.failure() {
            debug!(
                component = "model",
                operation = "solve",
                status = solution.status.as_str(),
                rows = self.rows.len() as u64,
                columns = self.columns.len() as u64,
                "Solve failed"
            );
            return Err(failure.into());
        }
        if solution.column_values.len() != self.columns.len() {
            debug!(
                component = "model",
                operation = "solve",
                expected = self.columns.len() as u64,
                returned = solution.column_values.len() as u64,
                "Engine returned the wrong number of primal values"
            );
            return Err(SolveFailure::NumericalFailure.into());
        }

        debug!(
            component = "model",
            operation = "solve",
            status = solution.status.as_str(),
            objective = solution.objective_value,
            iterations = solution.iterations as u64,
            "Solve succeeded"
        );
        self.solution = Some(solution);
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn objective_value(&self) -> Result<f64, ModelError> {
        Ok(self.current_solution()?.objective_value)
    }

    /// Primal value of column `j` in the current solution.
    ///
    /// A missing solution is reported before a bad index.
    pub fn primal_value(&self, j: usize) -> Result<f64, ModelError> {
        let solution = self.current_solution()?;
        let pos = self.column_pos(j)?;
        Ok(solution.column_values[pos])
    }

    /// Primal value of the first column named `name`
    pub fn primal_value_by_name(&self, name: &str) -> Result<f64, ModelError> {
        self.current_solution()?;
        let j = self
            .find_column(name)
            .ok_or_else(|| ModelError::UnknownName(name.to_string()))?;
        self.primal_value(j)
    }

    /// Activity of row `i` in the current solution.
    ///
    /// Engines that report no row activities get it computed from the
    /// matrix and the column values.
    pub fn row_primal_value(&self, i: usize) -> Result<f64, ModelError> {
        let solution = self.current_solution()?;
        let pos = self.row_pos(i)?;
        if let Some(&value) = solution.row_values.get(pos) {
            return Ok(value);
        }
        Ok(self
            .matrix
            .range((i, 1)..=(i, usize::MAX))
            .map(|(&(_, j), &a)| a * solution.column_values[j - 1])
            .sum())
    }

    fn current_solution(&self) -> Result<&Solution, ModelError> {
        self.solution.as_ref().ok_or(ModelError::NoSolution)
    }

    fn invalidate(&mut self) {
        self.solution = None;
    }

    fn store_cell(&mut self, i: usize, j: usize, value: f64) {
        if value == 0.0 {
            self.matrix.remove(&(i, j));
        } else {
            self.matrix.insert((i, j), value);
        }
    }

    fn row_pos(&self, i: usize) -> Result<usize, ModelError> {
        index_pos(Axis::Row, i, self.rows.len())
    }

    fn column_pos(&self, j: usize) -> Result<usize, ModelError> {
        index_pos(Axis::Column, j, self.columns.len())
    }
}

/// Zero-based position of a 1-based index
fn index_pos(axis: Axis, index: usize, count: usize) -> Result<usize, ModelError> {
    if index == 0 || index > count {
        return Err(ModelError::IndexOutOfRange { axis, index, count });
    }
    Ok(index - 1)
}

fn validate_name(name: Option<&str>) -> Result<Option<String>, ModelError> {
    match name {
        None | Some("") => Ok(None),
        Some(name) => {
            let length = name.chars().count();
            if length > MAX_NAME_LEN {
                return Err(ModelError::InvalidName { length });
            }
            Ok(Some(name.to_string()))
        }
    }
}

fn validate_bound(kind: BoundType, lower: f64, upper: f64) -> Result<BoundSpec, ModelError> {
    let bounds = BoundSpec::from_parts(kind, lower, upper);
    if !bounds.is_consistent() {
        return Err(ModelError::InvalidBound { lower, upper });
    }
    Ok(bounds)
}
