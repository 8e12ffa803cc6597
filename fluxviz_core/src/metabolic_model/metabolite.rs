//! Species of the metabolic network
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

/// A metabolite (SBML species) taking part in the model's reactions
#[derive(Builder, Debug, Clone)]
pub struct Metabolite {
    /// Unique identifier, without the SBML `M_` prefix
    #[builder(setter(into))]
    pub id: String,
    /// Display name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Id of the compartment holding the metabolite
    #[builder(default = "None")]
    pub compartment: Option<String>,
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical formula, such as `C6H12O6`
    #[builder(default = "None")]
    pub formula: Option<String>,
}

impl Display for Metabolite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.id, name),
            None => write!(f, "{}", self.id),
        }
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // The same species id in two compartments is two metabolites
        self.id.hash(state);
        if let Some(ref compartment) = self.compartment {
            compartment.hash(state)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let glucose = MetaboliteBuilder::default()
            .id("glc__D_e")
            .name(Some("D-Glucose".to_string()))
            .compartment(Some("e".to_string()))
            .build()
            .unwrap();
        assert_eq!(format!("{}", glucose), "glc__D_e (D-Glucose)");
        assert_eq!(glucose.charge, 0);

        let anonymous = MetaboliteBuilder::default().id("x_c").build().unwrap();
        assert_eq!(format!("{}", anonymous), "x_c");
    }
}
