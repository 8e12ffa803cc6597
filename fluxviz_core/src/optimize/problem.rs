//! Provides struct representing an optimization problem
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::variable::Variable;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// A linear optimization problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem, in insertion order
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Position of a variable in the problem
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }
    // endregion Accessors

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        variable.index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_variable(Variable::new(id, lower_bound, upper_bound))
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint using variable ids, and add it to the model
    pub fn add_new_equality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        if variables.len() != coefficients.len() {
            return Err(ProblemError::MismatchedTerms);
        }
        self.add_constraint(Constraint::new_equality(id, variables, coefficients, equals))
    }

    /// Create a new inequality constraint using variable ids, and add it to the model
    pub fn add_new_inequality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if variables.len() != coefficients.len() {
            return Err(ProblemError::MismatchedTerms);
        }
        self.add_constraint(Constraint::new_inequality(
            id,
            variables,
            coefficients,
            lower_bound,
            upper_bound,
        ))
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term_by_id(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains_key(variable_id) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective
            .add_term(ObjectiveTerm::new(variable_id, coefficient));
        Ok(())
    }
    // endregion Adding Objective Terms

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id.clone()));
        };
        if variable.lower_bound.is_nan()
            || variable.upper_bound.is_nan()
            || variable.lower_bound > variable.upper_bound
        {
            return Err(ProblemError::InvalidVariableBounds(variable.id.clone()));
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(constraint.get_id()) {
            return Err(ProblemError::ConstraintAlreadyExists(
                constraint.get_id().to_string(),
            ));
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds(
                    constraint.get_id().to_string(),
                ));
            }
        }
        // Every variable must be known, and appear at most once
        let mut seen = IndexSet::new();
        for term in constraint.get_terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(ProblemError::NonExistentVariablesInConstraint(
                    constraint.get_id().to_string(),
                ));
            }
            if !seen.insert(term.variable.as_str()) {
                return Err(ProblemError::RepeatedVariableInConstraint(
                    constraint.get_id().to_string(),
                ));
            }
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add variable {0} which already exists")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Variable {0} has lower_bound > upper_bound")]
    InvalidVariableBounds(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add constraint {0} which already exists")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Inequality constraint {0} has lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Constraint {0} references variables not in the problem")]
    NonExistentVariablesInConstraint(String),
    /// Error when a constraint lists the same variable twice
    #[error("Constraint {0} lists a variable more than once")]
    RepeatedVariableInConstraint(String),
    /// Error when variables and coefficients differ in length
    #[error("Number of variables and coefficients differ")]
    MismatchedTerms,
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the problem")]
    NonExistentVariablesInObjective,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_problem() {
        let max_problem = Problem::new(ObjectiveSense::Maximize);
        assert_eq!(max_problem.objective().sense(), ObjectiveSense::Maximize);
        assert_eq!(max_problem.num_variables(), 0);

        let min_problem = Problem::new(ObjectiveSense::Minimize);
        assert_eq!(min_problem.objective().sense(), ObjectiveSense::Minimize);
        assert!(min_problem.objective().is_empty());
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        problem.add_new_variable("x", 64., 100.).unwrap();
        problem.add_new_variable("y", -5., 5.).unwrap();
        if let Some(var) = problem.variables.get("y") {
            assert_eq!(var.index(), 1);
            assert!(
                (var.lower_bound + 5.0).abs() < 1e-25,
                "Variable added with incorrect lower bound"
            );
            assert!(
                (var.upper_bound - 5.0).abs() < 1e-25,
                "Variable added with incorrect upper bound"
            );
        } else {
            panic!("Variable not added to model")
        }
        assert_eq!(problem.variable_index("x"), Some(0));
        assert_eq!(problem.num_variables(), 2);

        // Duplicate ids are rejected
        match problem.add_new_variable("x", 0., 1.) {
            Err(ProblemError::VariableIdAlreadyExists(id)) => assert_eq!(id, "x"),
            _ => panic!("Duplicate variable not caught"),
        }
    }

    #[test]
    fn add_bad_variable() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        let res = problem.add_new_variable("x", 100., 64.);
        if let Err(ProblemError::InvalidVariableBounds(_)) = res {
            // Intentionally blank
        } else {
            panic!("Invalid variable bounds not caught")
        }
    }

    #[test]
    fn add_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_new_variable("x", 64., 100.).unwrap();
        problem.add_new_variable("y", 64., 100.).unwrap();

        problem
            .add_new_equality_constraint_by_id("test_constraint", &["x", "y"], &[2., 3.], 200.)
            .unwrap();

        let cons = problem.constraints.get("test_constraint").unwrap();
        match cons {
            Constraint::Equality { equals, .. } => {
                assert!((equals - 200.).abs() < 1e-25)
            }
            Constraint::Inequality { .. } => panic!("Incorrect constraint type added"),
        }

        problem
            .add_new_inequality_constraint_by_id("other", &["x", "y"], &[2., 3.], 100., 200.)
            .unwrap();
        let cons = problem.constraints.get("other").unwrap();
        match cons {
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                assert!((lower_bound - 100.).abs() < 1e-25);
                assert!((upper_bound - 200.).abs() < 1e-25);
            }
            Constraint::Equality { .. } => panic!("Incorrect constraint type added"),
        }
        assert_eq!(problem.num_constraints(), 2);
    }

    #[test]
    fn add_bad_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_new_variable("x", 64., 100.).unwrap();
        problem.add_new_variable("y", 64., 100.).unwrap();

        if let Err(ProblemError::InvalidConstraintBounds(_)) = problem
            .add_new_inequality_constraint_by_id("bad_constraint", &["x", "y"], &[2., 3.], 200., 100.)
        {
        } else {
            panic!("Invalid constraint bounds not caught")
        }

        if let Err(ProblemError::NonExistentVariablesInConstraint(_)) =
            problem.add_new_equality_constraint_by_id("missing", &["x", "z"], &[1., 1.], 0.)
        {
        } else {
            panic!("Unknown variable in constraint not caught")
        }

        if let Err(ProblemError::RepeatedVariableInConstraint(_)) =
            problem.add_new_equality_constraint_by_id("repeat", &["x", "x"], &[1., 1.], 0.)
        {
        } else {
            panic!("Repeated variable in constraint not caught")
        }

        if let Err(ProblemError::MismatchedTerms) =
            problem.add_new_equality_constraint_by_id("short", &["x", "y"], &[1.], 0.)
        {
        } else {
            panic!("Mismatched terms not caught")
        }
    }

    #[test]
    fn objective_terms() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        assert_eq!(problem.objective().terms().len(), 1);
        assert!(problem
            .add_new_linear_objective_term_by_id("nope", 1.)
            .is_err());
    }
}
