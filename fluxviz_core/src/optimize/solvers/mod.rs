//! Solver backends for linear problems
pub mod microlp_solver;

use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;
use thiserror::Error;

pub use microlp_solver::MicroLpSolver;

/// A backend able to solve continuous linear problems
///
/// Infeasible and unbounded problems are reported through the status of the returned
/// [`ProblemSolution`], `Err` is reserved for failures of the solver itself.
pub trait LinearSolver {
    /// Short name of the backend, used in log messages
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

#[derive(Error, Debug, Clone)]
pub enum SolverError {
    #[error("Problem has no variables")]
    EmptyProblem,
    #[error("Variable {0} referenced by a constraint is not in the problem")]
    UnknownVariable(String),
    #[error("Solver failed: {0}")]
    Internal(String),
}
