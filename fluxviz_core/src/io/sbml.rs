//! Module providing SBML input for Models
//!
//! Supports SBML Level 3 with the Flux Balance Constraints package (version 1 flux bounds and
//! version 2 parameter bounds, objectives and gene products), the groups package for
//! subsystems, and the older COBRA Level 2 layout which keeps bounds and objective
//! coefficients in kinetic law parameters and gene rules in notes.
//!
//! Identifiers are normalized the way BiGG and cobrapy do it: the `R_`, `M_` and `G_` prefixes
//! are removed, and `__NN__` escapes are replaced by the character with code NN.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use roxmltree::{Document, Node};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::genes_in_rule;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};
use crate::optimize::objective::ObjectiveSense;

impl Model {
    /// Read a model from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let sbml = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(SbmlError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_sbml_str(&sbml)
    }

    /// Parse a model from an SBML document
    pub fn from_sbml_str(sbml: &str) -> Result<Model, SbmlError> {
        let document = Document::parse(sbml)?;
        let root = document.root_element();
        if root.tag_name().name() != "sbml" {
            return Err(SbmlError::NotSbml(root.tag_name().name().to_string()));
        }
        let model_node = child(root, "model").ok_or(SbmlError::NoModel)?;
        SbmlReader::new(model_node)?.read(model_node)
    }
}

/// Lookup tables gathered before the reactions are read
struct SbmlReader {
    /// Global parameters, by raw SBML id
    parameters: HashMap<String, f64>,
    /// FBC version 1 bounds by raw reaction id, (lower, upper)
    flux_bounds: HashMap<String, (Option<f64>, Option<f64>)>,
    /// Normalized gene id of every FBC gene product, by raw SBML id
    gene_products: HashMap<String, String>,
    /// Raw ids of species with a boundary condition, these are not mass balanced
    boundary_species: HashSet<String>,
    /// Subsystem of each reaction, by raw reaction id
    subsystems: HashMap<String, String>,
    configuration: Configuration,
}

impl SbmlReader {
    fn new(model_node: Node) -> Result<Self, SbmlError> {
        let mut parameters = HashMap::new();
        for parameter in list_items(model_node, "listOfParameters", "parameter") {
            let id = required_attribute(parameter, "id", "parameter")?;
            if let Some(value) = parameter.attribute("value") {
                parameters.insert(id.to_string(), parse_number(value, id)?);
            }
        }

        let mut flux_bounds: HashMap<String, (Option<f64>, Option<f64>)> = HashMap::new();
        for bound in list_items(model_node, "listOfFluxBounds", "fluxBound") {
            let (Some(reaction), Some(operation), Some(value)) = (
                fbc_attribute(bound, "reaction"),
                fbc_attribute(bound, "operation"),
                fbc_attribute(bound, "value"),
            ) else {
                continue;
            };
            let value = parse_number(value, reaction)?;
            let entry = flux_bounds.entry(reaction.to_string()).or_default();
            match operation {
                "greaterEqual" | "greater" => entry.0 = Some(value),
                "lessEqual" | "less" => entry.1 = Some(value),
                "equal" => *entry = (Some(value), Some(value)),
                other => log::warn!("Ignoring flux bound with unknown operation {}", other),
            }
        }

        let gene_products = list_items(model_node, "listOfGeneProducts", "geneProduct")
            .filter_map(|product| fbc_attribute(product, "id"))
            .map(|id| (id.to_string(), normalize_id(id, "G_")))
            .collect();

        let boundary_species = list_items(model_node, "listOfSpecies", "species")
            .filter(|species| species.attribute("boundaryCondition") == Some("true"))
            .filter_map(|species| species.attribute("id"))
            .map(|id| id.to_string())
            .collect();

        let mut subsystems = HashMap::new();
        for group in list_items(model_node, "listOfGroups", "group") {
            let Some(name) = namespaced_attribute(group, "name", "/groups/") else {
                continue;
            };
            for member in list_items(group, "listOfMembers", "member") {
                if let Some(reaction) = namespaced_attribute(member, "idRef", "/groups/") {
                    subsystems
                        .entry(reaction.to_string())
                        .or_insert_with(|| name.to_string());
                }
            }
        }

        Ok(SbmlReader {
            parameters,
            flux_bounds,
            gene_products,
            boundary_species,
            subsystems,
            configuration: Configuration::current(),
        })
    }

    fn read(&self, model_node: Node) -> Result<Model, SbmlError> {
        let mut model = Model::new_empty();
        model.id = model_node.attribute("id").map(|id| id.to_string());
        model.name = model_node.attribute("name").map(|name| name.to_string());

        let compartments: IndexMap<String, String> =
            list_items(model_node, "listOfCompartments", "compartment")
                .filter_map(|c| {
                    let id = c.attribute("id")?;
                    Some((id.to_string(), c.attribute("name").unwrap_or(id).to_string()))
                })
                .collect();
        if !compartments.is_empty() {
            model.compartments = Some(compartments);
        }

        for species in list_items(model_node, "listOfSpecies", "species") {
            let id = required_attribute(species, "id", "species")?;
            if self.boundary_species.contains(id) {
                continue;
            }
            let charge = fbc_attribute(species, "charge")
                .or_else(|| species.attribute("charge"))
                .and_then(|charge| charge.trim().parse::<f64>().ok())
                .map(|charge| charge.round() as i32)
                .unwrap_or_default();
            model.add_metabolite(Metabolite {
                id: normalize_id(id, "M_"),
                name: species.attribute("name").map(|n| n.to_string()),
                compartment: species.attribute("compartment").map(|c| c.to_string()),
                charge,
                formula: fbc_attribute(species, "chemicalFormula").map(|f| f.to_string()),
            });
        }

        for product in list_items(model_node, "listOfGeneProducts", "geneProduct") {
            let Some(raw_id) = fbc_attribute(product, "id") else {
                continue;
            };
            model.add_gene(Gene::new(
                normalize_id(raw_id, "G_"),
                fbc_attribute(product, "name").map(|n| n.to_string()),
            ));
        }

        let mut legacy_objective: IndexMap<String, f64> = IndexMap::new();
        for reaction in list_items(model_node, "listOfReactions", "reaction") {
            let raw_id = required_attribute(reaction, "id", "reaction")?;
            let id = normalize_id(raw_id, "R_");
            let metabolites = self.stoichiometry(reaction, raw_id, &model)?;
            let (lower_bound, upper_bound) = self.bounds(reaction, raw_id)?;
            if lower_bound > upper_bound {
                return Err(SbmlError::InvalidBounds(id));
            }
            let gene_reaction_rule = match child(reaction, "geneProductAssociation") {
                Some(association) => association
                    .children()
                    .find(|n| n.is_element())
                    .map(|node| self.gene_rule(node, false)),
                None => note_value(reaction, &["GENE_ASSOCIATION", "GENE ASSOCIATION"]),
            }
            .filter(|rule| !rule.is_empty());
            let subsystem = self
                .subsystems
                .get(raw_id)
                .cloned()
                .or_else(|| note_value(reaction, &["SUBSYSTEM"]));
            if let Some(coefficient) = kinetic_law_parameter(reaction, "OBJECTIVE_COEFFICIENT")? {
                if coefficient != 0. {
                    legacy_objective.insert(id.clone(), coefficient);
                }
            }
            if let Some(rule) = &gene_reaction_rule {
                for gene_id in genes_in_rule(rule) {
                    if !model.genes.contains_key(gene_id) {
                        model.add_gene(Gene::new(gene_id.to_string(), None));
                    }
                }
            }

            model.add_reaction(
                ReactionBuilder::default()
                    .id(id)
                    .name(reaction.attribute("name").map(|n| n.to_string()))
                    .metabolites(metabolites)
                    .lower_bound(lower_bound)
                    .upper_bound(upper_bound)
                    .subsystem(subsystem)
                    .gene_reaction_rule(gene_reaction_rule)
                    .build()?,
            );
        }

        self.read_objective(model_node, &mut model)?;
        if model.objective.is_empty() && !legacy_objective.is_empty() {
            model.objective = legacy_objective;
        }
        if model.objective.is_empty() {
            log::warn!(
                "SBML model {} defines no objective",
                model.id.as_deref().unwrap_or("")
            );
        }
        Ok(model)
    }

    /// Metabolite coefficients of a reaction, negative for reactants
    fn stoichiometry(
        &self,
        reaction: Node,
        raw_id: &str,
        model: &Model,
    ) -> Result<IndexMap<String, f64>, SbmlError> {
        let mut metabolites: IndexMap<String, f64> = IndexMap::new();
        for (list, sign) in [("listOfReactants", -1.), ("listOfProducts", 1.)] {
            for reference in list_items(reaction, list, "speciesReference") {
                let species = required_attribute(reference, "species", "speciesReference")?;
                if self.boundary_species.contains(species) {
                    continue;
                }
                let metabolite_id = normalize_id(species, "M_");
                if !model.metabolites.contains_key(&metabolite_id) {
                    return Err(SbmlError::UnknownSpecies {
                        reaction: normalize_id(raw_id, "R_"),
                        species: species.to_string(),
                    });
                }
                let stoichiometry = match reference.attribute("stoichiometry") {
                    Some(value) => parse_number(value, raw_id)?,
                    None => 1.,
                };
                *metabolites.entry(metabolite_id).or_insert(0.) += sign * stoichiometry;
            }
        }
        Ok(metabolites)
    }

    /// Flux bounds of a reaction
    ///
    /// Bounds are looked up in the FBC attributes, then FBC version 1 flux bounds, then the
    /// legacy kinetic law parameters. A missing lower bound is 0 for irreversible reactions,
    /// other missing bounds take the cobra default parameters or the configured defaults.
    fn bounds(&self, reaction: Node, raw_id: &str) -> Result<(f64, f64), SbmlError> {
        let v1_bounds = self.flux_bounds.get(raw_id).copied().unwrap_or_default();
        let lower = match self.parameter_bound(reaction, raw_id, "lowerFluxBound")? {
            Some(value) => Some(value),
            None => match v1_bounds.0 {
                Some(value) => Some(value),
                None => kinetic_law_parameter(reaction, "LOWER_BOUND")?,
            },
        };
        let upper = match self.parameter_bound(reaction, raw_id, "upperFluxBound")? {
            Some(value) => Some(value),
            None => match v1_bounds.1 {
                Some(value) => Some(value),
                None => kinetic_law_parameter(reaction, "UPPER_BOUND")?,
            },
        };

        let reversible = reaction.attribute("reversible") != Some("false");
        let lower = lower.unwrap_or_else(|| {
            if reversible {
                self.parameters
                    .get("cobra_default_lb")
                    .copied()
                    .unwrap_or(self.configuration.lower_bound)
            } else {
                0.
            }
        });
        let upper = upper.unwrap_or_else(|| {
            self.parameters
                .get("cobra_default_ub")
                .copied()
                .unwrap_or(self.configuration.upper_bound)
        });
        Ok((lower, upper))
    }

    fn parameter_bound(
        &self,
        reaction: Node,
        raw_id: &str,
        attribute: &str,
    ) -> Result<Option<f64>, SbmlError> {
        match fbc_attribute(reaction, attribute) {
            None => Ok(None),
            Some(parameter) => match self.parameters.get(parameter) {
                Some(value) => Ok(Some(*value)),
                None => Err(SbmlError::UnknownParameter {
                    reaction: normalize_id(raw_id, "R_"),
                    parameter: parameter.to_string(),
                }),
            },
        }
    }

    /// Gene rule text of an FBC association node
    fn gene_rule(&self, node: Node, nested: bool) -> String {
        match node.tag_name().name() {
            "geneProductRef" => fbc_attribute(node, "geneProduct")
                .map(|product| {
                    self.gene_products
                        .get(product)
                        .cloned()
                        .unwrap_or_else(|| normalize_id(product, "G_"))
                })
                .unwrap_or_default(),
            operator @ ("and" | "or") => {
                let terms: Vec<String> = node
                    .children()
                    .filter(|n| n.is_element())
                    .map(|n| self.gene_rule(n, true))
                    .filter(|term| !term.is_empty())
                    .collect();
                let rule = terms.join(&format!(" {} ", operator));
                if nested && terms.len() > 1 {
                    format!("({})", rule)
                } else {
                    rule
                }
            }
            _ => String::new(),
        }
    }

    fn read_objective(&self, model_node: Node, model: &mut Model) -> Result<(), SbmlError> {
        let Some(objectives) = child(model_node, "listOfObjectives") else {
            return Ok(());
        };
        let active = fbc_attribute(objectives, "activeObjective");
        let objective = children_named(objectives, "objective")
            .find(|o| active.is_none() || fbc_attribute(*o, "id") == active)
            .or_else(|| children_named(objectives, "objective").next());
        let Some(objective) = objective else {
            return Ok(());
        };

        model.objective_sense = match fbc_attribute(objective, "type") {
            Some("minimize") => ObjectiveSense::Minimize,
            _ => ObjectiveSense::Maximize,
        };
        for flux_objective in list_items(objective, "listOfFluxObjectives", "fluxObjective") {
            let Some(raw_id) = fbc_attribute(flux_objective, "reaction") else {
                continue;
            };
            let id = normalize_id(raw_id, "R_");
            if !model.reactions.contains_key(&id) {
                return Err(SbmlError::UnknownObjectiveReaction(id));
            }
            let coefficient = match fbc_attribute(flux_objective, "coefficient") {
                Some(value) => parse_number(value, raw_id)?,
                None => 1.,
            };
            if coefficient != 0. {
                model.objective.insert(id, coefficient);
            }
        }
        Ok(())
    }
}

// region XML helpers
fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Elements of an SBML `listOf...` container
fn list_items<'a, 'input>(
    node: Node<'a, 'input>,
    list: &'static str,
    item: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    child(node, list)
        .into_iter()
        .flat_map(move |l| children_named(l, item))
}

fn namespaced_attribute<'a>(node: Node<'a, '_>, name: &str, namespace: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| {
            attr.name() == name && attr.namespace().is_some_and(|ns| ns.contains(namespace))
        })
        .map(|attr| attr.value())
}

fn fbc_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    namespaced_attribute(node, name, "/fbc/")
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    name: &'static str,
    element: &'static str,
) -> Result<&'a str, SbmlError> {
    node.attribute(name)
        .ok_or(SbmlError::MissingAttribute { element, attribute: name })
}

/// Value of a local parameter of the reaction's kinetic law, in Level 3 or Level 2 form
fn kinetic_law_parameter(reaction: Node, id: &str) -> Result<Option<f64>, SbmlError> {
    let Some(law) = child(reaction, "kineticLaw") else {
        return Ok(None);
    };
    for (list, item) in [
        ("listOfLocalParameters", "localParameter"),
        ("listOfParameters", "parameter"),
    ] {
        if let Some(parameter) = list_items(law, list, item).find(|p| p.attribute("id") == Some(id)) {
            return match parameter.attribute("value") {
                Some(value) => Ok(Some(parse_number(value, id)?)),
                None => Ok(None),
            };
        }
    }
    Ok(None)
}

/// Value of a `KEY: value` line in the notes of an element
fn note_value(node: Node, keys: &[&str]) -> Option<String> {
    let notes = child(node, "notes")?;
    notes
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .find_map(|text| {
            let (key, value) = text.trim().split_once(':')?;
            keys.contains(&key.trim())
                .then(|| value.trim().to_string())
        })
}
// endregion XML helpers

fn parse_number(value: &str, context: &str) -> Result<f64, SbmlError> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
        "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
        _ => trimmed.parse::<f64>().map_err(|_| SbmlError::InvalidNumber {
            value: value.to_string(),
            context: context.to_string(),
        }),
    }
}

/// Normalize an SBML identifier, removing `prefix` and decoding `__NN__` escapes
pub(crate) fn normalize_id(id: &str, prefix: &str) -> String {
    decode_escapes(id.strip_prefix(prefix).unwrap_or(id))
}

fn decode_escapes(id: &str) -> String {
    let bytes = id.as_bytes();
    let mut decoded = String::with_capacity(id.len());
    // start of the text not yet copied to decoded
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"__") {
            let digits = bytes[i + 2..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let end = i + 2 + digits;
            if digits > 0 && bytes[end..].starts_with(b"__") {
                if let Some(c) = id[i + 2..end].parse::<u32>().ok().and_then(char::from_u32) {
                    decoded.push_str(&id[start..i]);
                    decoded.push(c);
                    i = end + 2;
                    start = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    decoded.push_str(&id[start..]);
    decoded
}

#[derive(Error, Debug)]
pub enum SbmlError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Document root is <{0}>, not <sbml>")]
    NotSbml(String),
    #[error("SBML document contains no model")]
    NoModel,
    #[error("<{element}> is missing the {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Invalid number {value} for {context}")]
    InvalidNumber { value: String, context: String },
    #[error("Reaction {reaction} references undefined species {species}")]
    UnknownSpecies { reaction: String, species: String },
    #[error("Reaction {reaction} references undefined bound parameter {parameter}")]
    UnknownParameter { reaction: String, parameter: String },
    #[error("Reaction {0} has a lower bound above its upper bound")]
    InvalidBounds(String),
    #[error("Objective references undefined reaction {0}")]
    UnknownObjectiveReaction(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
}
