mod bounds;
mod engine;
mod problem;
mod simplex;
mod solution;

pub use bounds::{BoundSpec, BoundType, Direction};
pub use engine::SolvingEngine;
pub use problem::{LpProblem, MatrixEntry};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus, SolveFailure};
