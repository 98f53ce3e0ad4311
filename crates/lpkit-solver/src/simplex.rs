use tracing::{debug, trace};

use crate::engine::SolvingEngine;
use crate::problem::LpProblem;
use crate::solution::{Solution, SolutionStatus};

/// Consecutive zero-step pivots tolerated before switching to Bland's rule
const BLAND_AFTER_DEGENERATE_PIVOTS: usize = 16;

/// Dense two-phase simplex solver for bounded linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations (over both phases) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let solution = self.solve_inner(problem);
        debug!(
            component = "solver",
            operation = "solve",
            status = solution.status.as_str(),
            rows = problem.num_rows() as u64,
            columns = problem.num_columns() as u64,
            nnz = problem.entries.len() as u64,
            iterations = solution.iterations as u64,
            "Simplex finished"
        );
        solution
    }

    fn solve_inner(&self, problem: &LpProblem) -> Solution {
        if !problem.is_well_formed() {
            return Solution::numerical_failure();
        }

        let matrix = problem.dense_rows();
        let Some(form) = StandardForm::build(problem, &matrix) else {
            return Solution::infeasible();
        };

        let mut tableau = self.build_tableau(&form);
        let mut iterations = 0;

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut iterations) {
                SimplexResult::Optimal => {}
                other => return other.into_solution().with_iterations(iterations),
            }
            trace!(
                component = "solver",
                phase = 1u8,
                iterations = iterations as u64,
                "Feasible basis found"
            );
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau, &mut iterations) {
            SimplexResult::Optimal => {}
            other => return other.into_solution().with_iterations(iterations),
        }

        self.extract_solution(&tableau, &form, problem, &matrix)
            .with_iterations(iterations)
    }

    fn build_tableau(&self, form: &StandardForm) -> Tableau {
        let n_vars = form.n_vars;
        let n_constraints = form.constraints.len();

        // Flip rows with a negative RHS so every RHS starts non-negative
        let rows: Vec<(Vec<f64>, ConstraintOp, f64)> = form
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let coefficients = c.coefficients.iter().map(|v| -v).collect();
                    (coefficients, c.op.flipped(), -c.rhs)
                } else {
                    (c.coefficients.clone(), c.op, c.rhs)
                }
            })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs)) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(coefficients);
            tableau.data[i][total_cols - 1] = *rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row)
        // Simplex maximizes, so for minimization we negate the coefficients
        for (j, &coef) in form.objective.iter().enumerate() {
            tableau.data[n_constraints][j] = if form.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Auxiliary objective: maximize -sum(artificials)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();
        let art_end = art_start + tableau.n_artificial;

        let orig_obj = std::mem::replace(&mut tableau.data[n_constraints], vec![0.0; n_cols]);
        for j in art_start..art_end {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, art_end, iterations) {
            SimplexResult::Optimal => {}
            // The auxiliary objective is bounded above by zero
            SimplexResult::Unbounded => return SimplexResult::NumericalFailure,
            other => return other,
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            let artificial = tableau.basic_vars[i] >= art_start;
            if artificial && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis; rows where that is
        // impossible are redundant and keep their artificial at zero
        for i in 0..n_constraints {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let entering = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            if let Some(j) = entering {
                if !self.pivot(tableau, i, j) {
                    return SimplexResult::NumericalFailure;
                }
            }
        }

        // Restore original objective and adjust for basic variables
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Artificial columns may not re-enter the basis
        let limit = tableau.art_start();
        self.iterate(tableau, limit, iterations)
    }

    fn iterate(
        &self,
        tableau: &mut Tableau,
        limit: usize,
        iterations: &mut usize,
    ) -> SimplexResult {
        let rhs_col = tableau.data[0].len() - 1;
        let mut degenerate_run = 0;
        loop {
            // Switch to Bland's rule once the objective stalls
            let bland = degenerate_run >= BLAND_AFTER_DEGENERATE_PIVOTS;
            let Some(pivot_col) = self.find_pivot_column(tableau, limit, bland) else {
                return SimplexResult::Optimal;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col, bland) else {
                return SimplexResult::Unbounded;
            };
            if tableau.data[pivot_row][rhs_col] == 0.0 {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            if !self.pivot(tableau, pivot_row, pivot_col) {
                return SimplexResult::NumericalFailure;
            }
            *iterations += 1;
        }
    }

    /// Entering column: the most positive reduced cost, or under Bland's rule
    /// the lowest-index column with a positive reduced cost
    fn find_pivot_column(&self, tableau: &Tableau, limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        if bland {
            return (0..limit).find(|&j| tableau.data[obj_row][j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..limit {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    /// Leaving row by minimum ratio. Ties go to the first row, or under
    /// Bland's rule to the row whose basic variable has the lowest index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize, bland: bool) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col] / val;
            if ratio < 0.0 {
                continue;
            }
            let better = match min_row {
                None => true,
                Some(best) if bland => {
                    ratio < min_ratio
                        || (ratio == min_ratio && tableau.basic_vars[i] < tableau.basic_vars[best])
                }
                Some(_) => ratio < min_ratio,
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    /// Returns `false` if the pivot left non-finite values in the tableau
    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) -> bool {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();
        let rhs_col = n_cols - 1;

        let pivot_val = tableau.data[row][col];
        if !pivot_val.is_finite() || pivot_val == 0.0 {
            return false;
        }

        tableau.basic_vars[row] = col;

        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }

        // Round-off can push a degenerate RHS just below zero
        for i in 0..n_rows - 1 {
            let rhs = &mut tableau.data[i][rhs_col];
            if rhs.abs() < self.tolerance {
                *rhs = 0.0;
            }
        }

        tableau.data.iter().all(|r| r[rhs_col].is_finite())
    }

    fn extract_solution(
        &self,
        tableau: &Tableau,
        form: &StandardForm,
        problem: &LpProblem,
        matrix: &[Vec<f64>],
    ) -> Solution {
        let rhs_col = tableau.data[0].len() - 1;

        let mut y = vec![0.0; tableau.n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < tableau.n_vars {
                y[basic] = tableau.data[i][rhs_col];
            }
        }

        let column_values: Vec<f64> = form.columns.iter().map(|c| c.value(&y)).collect();
        let row_values: Vec<f64> = matrix
            .iter()
            .map(|row| row.iter().zip(&column_values).map(|(a, x)| a * x).sum::<f64>())
            .collect();
        let objective_value = problem.evaluate(&column_values);

        Solution::optimal(objective_value, column_values, row_values)
    }
}

impl SolvingEngine for Solver {
    fn solve(&mut self, problem: &LpProblem) -> Solution {
        Solver::solve(self, problem)
    }

    fn discard_factorization(&mut self) {
        // Every solve builds a fresh tableau, nothing is cached between calls
        trace!(component = "solver", operation = "discard_factorization", "No cached basis");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

#[derive(Debug, Clone)]
struct Constraint {
    coefficients: Vec<f64>,
    op: ConstraintOp,
    rhs: f64,
}

/// How an original column is recovered from the non-negative variables:
/// `x = offset + sum(sign * y[k])`
#[derive(Debug, Clone)]
struct ColumnMap {
    offset: f64,
    terms: Vec<(usize, f64)>,
}

impl ColumnMap {
    fn value(&self, y: &[f64]) -> f64 {
        self.offset + self.terms.iter().map(|&(k, sign)| sign * y[k]).sum::<f64>()
    }
}

/// The bounded problem rewritten over non-negative variables `y`
#[derive(Debug, Clone)]
struct StandardForm {
    n_vars: usize,
    minimize: bool,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
    columns: Vec<ColumnMap>,
}

impl StandardForm {
    /// Returns `None` when a bound admits no value on its own
    fn build(problem: &LpProblem, matrix: &[Vec<f64>]) -> Option<Self> {
        let mut n_vars = 0;
        let mut columns = Vec::with_capacity(problem.num_columns());
        // (y index, width) for double-bounded columns
        let mut upper_rows = Vec::new();

        for bounds in &problem.column_bounds {
            if !bounds.is_consistent() {
                return None;
            }
            let map = match (bounds.lower(), bounds.upper()) {
                (Some(l), Some(u)) if l == u => ColumnMap { offset: l, terms: Vec::new() },
                (Some(l), Some(u)) => {
                    upper_rows.push((n_vars, u - l));
                    n_vars += 1;
                    ColumnMap { offset: l, terms: vec![(n_vars - 1, 1.0)] }
                }
                (Some(l), None) => {
                    n_vars += 1;
                    ColumnMap { offset: l, terms: vec![(n_vars - 1, 1.0)] }
                }
                (None, Some(u)) => {
                    n_vars += 1;
                    ColumnMap { offset: u, terms: vec![(n_vars - 1, -1.0)] }
                }
                (None, None) => {
                    n_vars += 2;
                    ColumnMap { offset: 0.0, terms: vec![(n_vars - 2, 1.0), (n_vars - 1, -1.0)] }
                }
            };
            columns.push(map);
        }

        let mut objective = vec![0.0; n_vars];
        for (map, &coef) in columns.iter().zip(&problem.objective) {
            for &(k, sign) in &map.terms {
                objective[k] += coef * sign;
            }
        }

        let mut constraints = Vec::new();
        for (k, width) in upper_rows {
            let mut coefficients = vec![0.0; n_vars];
            coefficients[k] = 1.0;
            constraints.push(Constraint { coefficients, op: ConstraintOp::Le, rhs: width });
        }

        for (row, bounds) in matrix.iter().zip(&problem.row_bounds) {
            if !bounds.is_consistent() {
                return None;
            }
            let (lower, upper) = (bounds.lower(), bounds.upper());
            if lower.is_none() && upper.is_none() {
                continue;
            }

            let mut coefficients = vec![0.0; n_vars];
            let mut constant = 0.0;
            for (map, &a) in columns.iter().zip(row) {
                if a == 0.0 {
                    continue;
                }
                constant += a * map.offset;
                for &(k, sign) in &map.terms {
                    coefficients[k] += a * sign;
                }
            }

            match (lower, upper) {
                (Some(l), Some(u)) if l == u => {
                    constraints.push(Constraint {
                        coefficients,
                        op: ConstraintOp::Eq,
                        rhs: l - constant,
                    });
                }
                _ => {
                    if let Some(l) = lower {
                        constraints.push(Constraint {
                            coefficients: coefficients.clone(),
                            op: ConstraintOp::Ge,
                            rhs: l - constant,
                        });
                    }
                    if let Some(u) = upper {
                        constraints.push(Constraint {
                            coefficients,
                            op: ConstraintOp::Le,
                            rhs: u - constant,
                        });
                    }
                }
            }
        }

        Some(Self {
            n_vars,
            minimize: problem.direction.is_minimize(),
            objective,
            constraints,
            columns,
        })
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
    NumericalFailure,
}

impl SimplexResult {
    fn into_solution(self) -> Solution {
        match self {
            SimplexResult::Optimal => Solution::failed(SolutionStatus::NumericalFailure),
            SimplexResult::Unbounded => Solution::unbounded(),
            SimplexResult::Infeasible => Solution::infeasible(),
            SimplexResult::IterationLimit => Solution::iteration_limit(),
            SimplexResult::NumericalFailure => Solution::numerical_failure(),
        }
    }
}
