//! Implements a solver interface for microlp, a pure rust simplex solver
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection};
use indexmap::IndexMap;

use crate::configuration::Configuration;
use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug)]
pub struct MicroLpSolver {
    /// Values closer to zero than this are reported as zero
    tolerance: f64,
}

impl MicroLpSolver {
    pub fn new(tolerance: f64) -> Self {
        MicroLpSolver { tolerance }
    }

    fn snap(&self, value: f64) -> f64 {
        if value.abs() < self.tolerance {
            0.
        } else {
            value
        }
    }

    fn linear_expr(
        problem: &Problem,
        variables: &[::microlp::Variable],
        terms: &[ConstraintTerm],
    ) -> Result<LinearExpr, SolverError> {
        let mut expr = LinearExpr::empty();
        for term in terms {
            let index = problem
                .variable_index(&term.variable)
                .ok_or_else(|| SolverError::UnknownVariable(term.variable.clone()))?;
            expr.add(variables[index], term.coefficient);
        }
        Ok(expr)
    }
}

impl Default for MicroLpSolver {
    fn default() -> Self {
        MicroLpSolver::new(Configuration::current().tolerance)
    }
}

impl LinearSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        if problem.num_variables() == 0 {
            return Err(SolverError::EmptyProblem);
        }
        let direction = match problem.objective().sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = ::microlp::Problem::new(direction);

        let objective_coefficients = problem.objective().coefficients();
        let variables: Vec<::microlp::Variable> = problem
            .variables()
            .values()
            .map(|var| {
                let coefficient = objective_coefficients.get(&var.id).copied().unwrap_or(0.);
                lp.add_var(coefficient, (var.lower_bound, var.upper_bound))
            })
            .collect();

        for constraint in problem.constraints().values() {
            match constraint {
                Constraint::Equality { terms, equals, .. } => {
                    let expr = Self::linear_expr(problem, &variables, terms)?;
                    lp.add_constraint(expr, ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if lower_bound.is_finite() {
                        let expr = Self::linear_expr(problem, &variables, terms)?;
                        lp.add_constraint(expr, ComparisonOp::Ge, *lower_bound);
                    }
                    if upper_bound.is_finite() {
                        let expr = Self::linear_expr(problem, &variables, terms)?;
                        lp.add_constraint(expr, ComparisonOp::Le, *upper_bound);
                    }
                }
            }
        }
        log::debug!(
            "Solving problem with {} variables and {} constraints using {}",
            problem.num_variables(),
            problem.num_constraints(),
            self.name()
        );

        match lp.solve() {
            Ok(solution) => {
                let variable_values: IndexMap<String, f64> = problem
                    .variables()
                    .keys()
                    .zip(&variables)
                    .map(|(id, var)| (id.clone(), self.snap(*solution.var_value(*var))))
                    .collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(self.snap(solution.objective())),
                    variable_values: Some(variable_values),
                })
            }
            Err(::microlp::Error::Infeasible) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Infeasible))
            }
            Err(::microlp::Error::Unbounded) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Unbounded))
            }
            Err(::microlp::Error::InternalError(msg)) => Err(SolverError::Internal(msg)),
        }
    }
}
