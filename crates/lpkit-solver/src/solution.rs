use std::fmt;

use thiserror::Error;

/// The result of solving an LP problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Objective value at the optimum, shift included
    pub objective_value: f64,
    /// Primal value of each column, `column_values[j - 1]` for column `j`
    pub column_values: Vec<f64>,
    /// Activity of each row at the optimum
    pub row_values: Vec<f64>,
    /// Simplex iterations spent over both phases
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Input data or an intermediate pivot was not numerically usable
    NumericalFailure,
    /// Iteration budget exhausted before reaching optimality
    IterationLimit,
}

/// Why a solve produced no solution
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveFailure {
    #[error("problem has no feasible solution")]
    Infeasible,
    #[error("objective is unbounded")]
    Unbounded,
    #[error("numerical failure in the solving engine")]
    NumericalFailure,
    #[error("iteration limit exceeded")]
    IterationLimit,
}

impl SolutionStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }

    /// The failure this status stands for, `None` for [`SolutionStatus::Optimal`]
    pub fn failure(self) -> Option<SolveFailure> {
        match self {
            SolutionStatus::Optimal => None,
            SolutionStatus::Infeasible => Some(SolveFailure::Infeasible),
            SolutionStatus::Unbounded => Some(SolveFailure::Unbounded),
            SolutionStatus::NumericalFailure => Some(SolveFailure::NumericalFailure),
            SolutionStatus::IterationLimit => Some(SolveFailure::IterationLimit),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::NumericalFailure => "numerical_failure",
            SolutionStatus::IterationLimit => "iteration_limit",
        }
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Solution {
    pub fn optimal(objective_value: f64, column_values: Vec<f64>, row_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value,
            column_values,
            row_values,
            iterations: 0,
        }
    }

    /// A solution carrying only a non-optimal status and no values
    pub fn failed(status: SolutionStatus) -> Self {
        Self {
            status,
            objective_value: f64::NAN,
            column_values: Vec::new(),
            row_values: Vec::new(),
            iterations: 0,
        }
    }

    pub fn infeasible() -> Self {
        Self::failed(SolutionStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::failed(SolutionStatus::Unbounded)
    }

    pub fn numerical_failure() -> Self {
        Self::failed(SolutionStatus::NumericalFailure)
    }

    pub fn iteration_limit() -> Self {
        Self::failed(SolutionStatus::IterationLimit)
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}
