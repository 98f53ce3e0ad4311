mod error;
mod model;

pub use error::{Axis, ModelError};
pub use model::{MAX_NAME_LEN, ProblemModel};

pub use lpkit_solver::{
    BoundSpec, BoundType, Direction, LpProblem, MatrixEntry, Solution, SolutionStatus, SolveFailure,
    Solver, SolvingEngine,
};
