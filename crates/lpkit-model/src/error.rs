use std::fmt;

use lpkit_solver::SolveFailure;
use thiserror::Error;

/// Which list an index or dimension refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{axis} index {index} out of range (problem has {count})")]
    IndexOutOfRange { axis: Axis, index: usize, count: usize },
    #[error("Name is {length} characters long, the limit is 255")]
    InvalidName { length: usize },
    #[error("Invalid bound: no value fits lower ({lower}) and upper ({upper})")]
    InvalidBound { lower: f64, upper: f64 },
    #[error("Matrix needs {supplied} {axis}s but the problem has {available}")]
    DimensionMismatch { axis: Axis, supplied: usize, available: usize },
    #[error("Unknown column: {0}")]
    UnknownName(String),
    #[error("No solution available")]
    NoSolution,
    #[error("Solve failed: {0}")]
    SolveFailure(#[from] SolveFailure),
}
