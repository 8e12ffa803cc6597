//! Flux Balance Analysis of a [`Model`]
//!
//! FBA finds a steady state flux distribution (`S v = 0`) within the reaction bounds which
//! optimizes the model objective, see
//! [What is flux balance analysis?, Orth et al., 2010](https://www.ncbi.nlm.nih.gov/pmc/articles/PMC3108565/)
pub mod table;

use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::model::Model;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{LinearSolver, SolverError};
use crate::optimize::OptimizationStatus;

/// Result of optimizing a model
#[derive(Debug, Clone)]
pub struct FbaSolution {
    pub status: OptimizationStatus,
    /// Value of the objective at the optimum, None if the solver produced no point
    pub objective_value: Option<f64>,
    /// Flux of every reaction keyed by reaction id, in model order
    pub fluxes: Option<IndexMap<String, f64>>,
}

impl FbaSolution {
    /// Flux of a single reaction
    pub fn flux(&self, reaction_id: &str) -> Option<f64> {
        self.fluxes.as_ref()?.get(reaction_id).copied()
    }

    pub fn is_optimal(&self) -> bool {
        self.status == OptimizationStatus::Optimal
    }
}

impl Model {
    /// Formulate the FBA linear problem of the model
    ///
    /// One variable per reaction bounded by its flux bounds, one mass balance equality per
    /// metabolite which takes part in at least one reaction.
    pub fn to_problem(&self) -> Result<Problem, OptimizeError> {
        if self.objective.is_empty() {
            return Err(OptimizeError::NoObjective);
        }
        let mut problem = Problem::new(self.objective_sense);
        for reaction in self.reactions.values() {
            problem.add_new_variable(&reaction.id, reaction.lower_bound, reaction.upper_bound)?;
        }

        // Gather the stoichiometric matrix row by row, in metabolite order
        let mut rows: IndexMap<&str, (Vec<&str>, Vec<f64>)> = self
            .metabolites
            .keys()
            .map(|id| (id.as_str(), (Vec::new(), Vec::new())))
            .collect();
        for reaction in self.reactions.values() {
            for (metabolite, coefficient) in &reaction.metabolites {
                let (variables, coefficients) = rows.entry(metabolite.as_str()).or_default();
                variables.push(reaction.id.as_str());
                coefficients.push(*coefficient);
            }
        }
        for (metabolite, (variables, coefficients)) in rows {
            if variables.is_empty() {
                continue;
            }
            problem.add_new_equality_constraint_by_id(metabolite, &variables, &coefficients, 0.)?;
        }

        for (reaction_id, coefficient) in &self.objective {
            problem
                .add_new_linear_objective_term_by_id(reaction_id, *coefficient)
                .map_err(|_| OptimizeError::UnknownObjectiveReaction(reaction_id.clone()))?;
        }
        Ok(problem)
    }

    /// Run Flux Balance Analysis with the given solver
    ///
    /// Infeasible and unbounded problems are not errors, they are reported through the
    /// status of the returned [`FbaSolution`].
    pub fn optimize<S: LinearSolver>(&self, solver: &S) -> Result<FbaSolution, OptimizeError> {
        let problem = self.to_problem()?;
        log::debug!(
            "FBA problem for {} built with {} variables and {} mass balances",
            self.id.as_deref().unwrap_or("model"),
            problem.num_variables(),
            problem.num_constraints()
        );
        let solution = solver.solve(&problem)?;
        Ok(FbaSolution {
            status: solution.status,
            objective_value: solution.objective_value,
            fluxes: solution.variable_values,
        })
    }
}

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Model has no objective")]
    NoObjective,
    #[error("Objective reaction {0} is not in the model")]
    UnknownObjectiveReaction(String),
    #[error("Unable to formulate the FBA problem: {0}")]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::optimize::solvers::MicroLpSolver;

    /// Linear pathway: uptake -> A -> B -> biomass, with a side branch A -> C -> secretion
    pub(crate) fn linear_pathway() -> Model {
        let mut model = Model::new_empty();
        model.id = Some("linear_pathway".to_string());
        for met in ["A", "B", "C"] {
            model.add_metabolite(MetaboliteBuilder::default().id(met).build().unwrap());
        }
        let reactions = [
            ("EX_A", "A uptake", vec![("A", 1.0)], 0., 10.),
            ("R1", "A to B", vec![("A", -1.0), ("B", 1.0)], 0., 1000.),
            ("R2", "A to C", vec![("A", -1.0), ("C", 1.0)], 0., 1000.),
            ("EX_C", "C secretion", vec![("C", -1.0)], 0., 1000.),
            ("BIOMASS", "Biomass", vec![("B", -2.0)], 0., 1000.),
        ];
        for (id, name, mets, lb, ub) in reactions {
            model.add_reaction(
                ReactionBuilder::default()
                    .id(id)
                    .name(Some(name.to_string()))
                    .metabolites(mets.into_iter().map(|(m, c)| (m.to_string(), c)).collect())
                    .lower_bound(lb)
                    .upper_bound(ub)
                    .build()
                    .unwrap(),
            );
        }
        model.set_objective("BIOMASS").unwrap();
        model
    }

    #[test]
    fn problem_formulation() {
        let model = linear_pathway();
        let problem = model.to_problem().unwrap();
        assert_eq!(problem.num_variables(), 5);
        assert_eq!(problem.num_constraints(), 3);
        let keys: Vec<&String> = problem.variables().keys().collect();
        assert_eq!(keys, vec!["EX_A", "R1", "R2", "EX_C", "BIOMASS"]);
        assert_eq!(
            format!("{}", problem.constraints()["A"]),
            "1*EX_A + -1*R1 + -1*R2 = 0"
        );
    }

    #[test]
    fn optimize_linear_pathway() {
        let model = linear_pathway();
        let solution = model.optimize(&MicroLpSolver::default()).unwrap();
        assert!(solution.is_optimal());
        // All 10 units of A go to B, 2 B per biomass
        assert!((solution.objective_value.unwrap() - 5.0).abs() < 1e-6);
        assert!((solution.flux("R1").unwrap() - 10.0).abs() < 1e-6);
        assert!(solution.flux("R2").unwrap().abs() < 1e-6);
        assert_eq!(solution.fluxes.as_ref().unwrap().len(), 5);
    }

    #[test]
    fn infeasible_model() {
        let mut model = linear_pathway();
        // Force a minimum biomass flux that the uptake can't support
        model.reactions.get_mut("BIOMASS").unwrap().lower_bound = 100.;
        let solution = model.optimize(&MicroLpSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.fluxes.is_none());
        assert!(solution.flux("R1").is_none());
    }

    #[test]
    fn missing_objective() {
        let mut model = linear_pathway();
        model.objective.clear();
        match model.optimize(&MicroLpSolver::default()) {
            Err(OptimizeError::NoObjective) => {}
            _ => panic!("Model without objective was optimized"),
        }
    }

    #[test]
    fn unknown_objective_reaction() {
        let mut model = linear_pathway();
        model.objective.insert("GONE".to_string(), 1.0);
        match model.to_problem() {
            Err(OptimizeError::UnknownObjectiveReaction(id)) => assert_eq!(id, "GONE"),
            _ => panic!("Unknown objective reaction not caught"),
        }
    }
}
