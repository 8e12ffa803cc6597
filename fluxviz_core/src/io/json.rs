//! Module providing JSON input for Models, in the COBRA JSON format written by cobrapy and BiGG
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::io::genes_in_rule;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model
#[derive(Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    genes: Vec<JsonGene>,
    id: Option<String>,
    name: Option<String>,
    compartments: Option<IndexMap<String, String>>,
    version: Option<String>,
}

#[derive(Deserialize)]
struct JsonMetabolite {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    charge: Option<i32>,
    formula: Option<String>,
}

#[derive(Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    objective_coefficient: Option<f64>,
    subsystem: Option<String>,
}

#[derive(Deserialize)]
struct JsonGene {
    id: String,
    name: Option<String>,
}
// endregion JSON Model

// region Conversions
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Gene::new(g.id, g.name)
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
        }
    }
}

impl TryFrom<JsonReaction> for Reaction {
    type Error = ReactionBuilderError;

    fn try_from(rxn: JsonReaction) -> Result<Self, Self::Error> {
        let rule = if rxn.gene_reaction_rule.trim().is_empty() {
            None
        } else {
            Some(rxn.gene_reaction_rule)
        };
        ReactionBuilder::default()
            .id(rxn.id)
            .metabolites(rxn.metabolites)
            .name(rxn.name)
            .gene_reaction_rule(rule)
            .lower_bound(rxn.lower_bound)
            .upper_bound(rxn.upper_bound)
            .subsystem(rxn.subsystem)
            .build()
    }
}

impl Model {
    /// Read a model from a COBRA JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a COBRA JSON string
    pub fn from_json_str(json: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(json) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{}", err))),
        };
        Model::from_json(json_model)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        model.id = json_model.id;
        model.name = json_model.name;
        model.compartments = json_model.compartments;
        model.version = json_model.version;

        json_model
            .genes
            .into_iter()
            .for_each(|g| model.add_gene(Gene::from(g)));
        json_model
            .metabolites
            .into_iter()
            .for_each(|m| model.add_metabolite(Metabolite::from(m)));
        /* Now, iterate through the reactions, registering genes which only show up in
        rules, and adding to the objective along the way
        */
        for rxn in json_model.reactions {
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0. {
                    model.objective.insert(rxn.id.clone(), coef);
                }
            }
            let reaction = Reaction::try_from(rxn)?;
            if let Some(rule) = &reaction.gene_reaction_rule {
                for gene_id in genes_in_rule(rule) {
                    if !model.genes.contains_key(gene_id) {
                        model.add_gene(Gene::new(gene_id.to_string(), None));
                    }
                }
            }
            if reaction.lower_bound > reaction.upper_bound {
                return Err(JsonError::InvalidBounds(reaction.id));
            }
            model.add_reaction(reaction);
        }
        Ok(model)
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Reaction {0} has a lower bound above its upper bound")]
    InvalidBounds(String),
}
// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;
    use crate::optimize::objective::ObjectiveSense;
    use std::path::PathBuf;

    fn toy_model_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("toy_model.json")
    }

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{
"original_bigg_ids":[
"glc_D_e"
]
},
"annotation":{
"bigg.metabolite":[
"glc__D"
],
"kegg.compound":[
"C00031"
],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.name.unwrap(), "D-Glucose");
        assert_eq!(met.compartment.unwrap(), "e");
        assert_eq!(met.charge.unwrap(), 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{
"adp_c":1.0,
"atp_c":-1.0,
"f6p_c":-1.0,
"fdp_c":1.0,
"h_c":1.0
},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis",
"annotation":{
"ec-code":[
"2.7.1.11"
],
"sbo":"SBO:0000176"
}
}"#;
        let json_reaction: JsonReaction = serde_json::from_str(data).unwrap();
        let reaction = Reaction::try_from(json_reaction).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.display_name(), "Phosphofructokinase");
        let keys: Vec<&String> = reaction.metabolites.keys().collect();
        assert_eq!(keys, vec!["adp_c", "atp_c", "f6p_c", "fdp_c", "h_c"]);
        assert!((reaction.metabolites["atp_c"] + 1.0).abs() < 1e-25);
        assert!(reaction.lower_bound.abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.0).abs() < 1e-25);
        assert_eq!(reaction.gene_reaction_rule.unwrap(), "b3916 or b1723");
        assert_eq!(reaction.subsystem.unwrap(), "Glycolysis/Gluconeogenesis");
    }

    #[test]
    fn empty_rule_is_none() {
        let data = r#"{"id":"ATPM","metabolites":{"atp_c":-1.0},"lower_bound":1.0,"upper_bound":1000.0,"gene_reaction_rule":""}"#;
        let json_reaction: JsonReaction = serde_json::from_str(data).unwrap();
        let reaction = Reaction::try_from(json_reaction).unwrap();
        assert!(reaction.gene_reaction_rule.is_none());
        assert!(reaction.name.is_none());
    }

    #[test]
    fn read_toy_model() {
        let model = Model::read_json(toy_model_path()).unwrap();
        assert_eq!(model.id.as_deref(), Some("toy_model"));
        assert_eq!(model.reactions.len(), 10);
        assert_eq!(model.metabolites.len(), 8);
        assert_eq!(model.genes.len(), 6);
        assert_eq!(model.objective.len(), 1);
        assert!((model.objective["BIOMASS"] - 1.0).abs() < 1e-25);
        assert_eq!(model.objective_sense, ObjectiveSense::Maximize);
        assert_eq!(model.reactions.get_index(0).unwrap().0, "EX_glc__D_e");
        assert!((model.reactions["EX_glc__D_e"].lower_bound + 10.).abs() < 1e-25);
        assert_eq!(
            model.compartments.as_ref().unwrap()["e"],
            "extracellular space"
        );
        assert_eq!(model.metabolites["g6p_c"].charge, -2);
    }

    #[test]
    fn genes_only_in_rules_are_added() {
        let data = r#"{
"metabolites":[{"id":"a_c"}],
"reactions":[{"id":"R","metabolites":{"a_c":-1.0},"lower_bound":0.0,"upper_bound":10.0,"gene_reaction_rule":"(g1 and g2) or g3"}],
"genes":[{"id":"g1","name":"first"}]
}"#;
        let model = Model::from_json_str(data).unwrap();
        let genes: Vec<&String> = model.genes.keys().collect();
        assert_eq!(genes, vec!["g1", "g2", "g3"]);
        assert_eq!(model.genes["g1"].name.as_deref(), Some("first"));
        assert!(model.objective.is_empty());
    }

    #[test]
    fn missing_file() {
        match Model::read_json("does/not/exist.json") {
            Err(JsonError::UnableToRead(_)) => {}
            _ => panic!("Missing file was read"),
        }
    }

    #[test]
    fn malformed_json() {
        match Model::from_json_str("{\"reactions\": [") {
            Err(JsonError::UnableToParse(_)) => {}
            _ => panic!("Malformed json was parsed"),
        }
    }

    #[test]
    fn inverted_bounds() {
        let data = r#"{"metabolites":[],"reactions":[{"id":"R","metabolites":{},"lower_bound":5.0,"upper_bound":1.0}]}"#;
        match Model::from_json_str(data) {
            Err(JsonError::InvalidBounds(id)) => assert_eq!(id, "R"),
            _ => panic!("Inverted bounds accepted"),
        }
    }
}
