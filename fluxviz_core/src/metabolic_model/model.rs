//! This module provides the Model struct for representing an entire metabolic model
use std::fmt::{Display, Formatter};

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::objective::ObjectiveSense;

use indexmap::IndexMap;
use thiserror::Error;

/// Represents a Genome Scale Metabolic Model
///
/// All collections keep the order in which the model file lists them, flux tables rely on
/// the reaction order.
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Whether the objective is maximized or minimized
    pub objective_sense: ObjectiveSense,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Display name of the Model
    pub name: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            objective_sense: ObjectiveSense::Maximize,
            id: None,
            name: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use fluxviz_core::metabolic_model::model::Model;
    /// use fluxviz_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction").build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a gene to the model
    ///
    /// # Parameters
    /// - gene: Gene to add
    ///
    /// # Examples
    /// ```rust
    /// use fluxviz_core::metabolic_model::gene::GeneBuilder;
    /// use fluxviz_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene").build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Make a single reaction the objective, with a coefficient of 1
    ///
    /// Any previous objective terms are dropped, the objective sense is left unchanged.
    pub fn set_objective(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::ReactionNotFound(reaction_id.to_string()));
        }
        self.objective.clear();
        self.objective.insert(reaction_id.to_string(), 1.0);
        Ok(())
    }

    /// Human readable objective expression, e.g. `1*BIOMASS`
    pub fn objective_expression(&self) -> String {
        self.objective
            .iter()
            .map(|(id, coef)| format!("{}*{}", coef, id))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} reactions, {} metabolites, {} genes)",
            self.id.as_deref().unwrap_or("unnamed model"),
            self.reactions.len(),
            self.metabolites.len(),
            self.genes.len()
        )
    }
}

/// Errors raised when modifying a model
#[derive(Clone, Debug, Error)]
pub enum ModelError {
    #[error("Reaction {0} is not present in the model")]
    ReactionNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GeneBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        model.id = Some("toy".to_string());
        model.add_reaction(ReactionBuilder::default().id("R1").build().unwrap());
        model.add_reaction(ReactionBuilder::default().id("BIOMASS").build().unwrap());
        model.add_gene(GeneBuilder::default().id("b0001").build().unwrap());
        model
    }

    #[test]
    fn set_objective_replaces_terms() {
        let mut model = setup_model();
        model.set_objective("R1").unwrap();
        model.set_objective("BIOMASS").unwrap();
        assert_eq!(model.objective.len(), 1);
        assert!((model.objective["BIOMASS"] - 1.0).abs() < 1e-25);
        assert_eq!(model.objective_expression(), "1*BIOMASS");
    }

    #[test]
    fn set_unknown_objective() {
        let mut model = setup_model();
        model.set_objective("R1").unwrap();
        match model.set_objective("NOT_A_REACTION") {
            Err(ModelError::ReactionNotFound(id)) => assert_eq!(id, "NOT_A_REACTION"),
            Ok(_) => panic!("Unknown reaction accepted as objective"),
        }
        // The previous objective is kept
        assert!(model.objective.contains_key("R1"));
    }

    #[test]
    fn display() {
        let model = setup_model();
        assert_eq!(
            format!("{}", model),
            "toy (2 reactions, 0 metabolites, 1 genes)"
        );
    }
}
