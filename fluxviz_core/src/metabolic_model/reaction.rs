//! This module provides a struct for representing reactions
use crate::configuration::Configuration;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction, negative for consumed metabolites
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "Configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "Configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Gene reaction rule as text, e.g. `b3916 or b1723`
    #[builder(default = "None")]
    pub gene_reaction_rule: Option<String>,
}

impl Reaction {
    /// Name used in tables and charts, empty when the model gives none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Whether the bounds allow flux in the reverse direction
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0f64
    }

    /// Exchange, demand and sink reactions only touch a single metabolite
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_come_from_configuration() {
        let reaction = ReactionBuilder::default().id("PFK").build().unwrap();
        assert!((reaction.lower_bound + 1000.).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.).abs() < 1e-25);
        assert!(reaction.is_reversible());
        assert_eq!(reaction.display_name(), "");
    }

    #[test]
    fn boundary_reaction() {
        let mut metabolites = IndexMap::new();
        metabolites.insert("glc__D_e".to_string(), -1.0);
        let exchange = ReactionBuilder::default()
            .id("EX_glc__D_e")
            .name(Some("D-Glucose exchange".to_string()))
            .metabolites(metabolites)
            .lower_bound(-10.)
            .build()
            .unwrap();
        assert!(exchange.is_boundary());
        assert_eq!(exchange.display_name(), "D-Glucose exchange");
    }
}
