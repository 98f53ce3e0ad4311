//! The boundary between a problem model and whatever solves it.

use crate::problem::LpProblem;
use crate::solution::Solution;

/// A linear programming engine.
///
/// An engine receives the full problem on every call and answers with a
/// status and, on success, the objective value and the primal values of
/// every column. Any solver that accepts bounds, an objective and a sparse
/// matrix satisfies this contract.
pub trait SolvingEngine {
    fn solve(&mut self, problem: &LpProblem) -> Solution;

    /// Drop any basis factorization kept from an earlier solve.
    ///
    /// Called before the next solve whenever rows were added since the
    /// previous one, since a factorization is tied to the old row count.
    fn discard_factorization(&mut self) {}
}
