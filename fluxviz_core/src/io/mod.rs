//! Module for reading Models from SBML and COBRA JSON files
pub mod json;
pub mod sbml;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::json::JsonError;
use crate::io::sbml::SbmlError;
use crate::metabolic_model::model::Model;

/// Read a model, choosing the format from the file extension
///
/// `.xml` and `.sbml` files are read as SBML, `.json` files as COBRA JSON.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let model = match extension.as_deref() {
        Some("xml") | Some("sbml") => Model::read_sbml(path)?,
        Some("json") => Model::read_json(path)?,
        _ => return Err(IoError::UnsupportedFormat(path.to_path_buf())),
    };
    log::debug!("Read {} from {}", model, path.display());
    Ok(model)
}

/// Gene ids referenced by a gene reaction rule, in order of first appearance
pub(crate) fn genes_in_rule(rule: &str) -> Vec<&str> {
    let mut genes: Vec<&str> = Vec::new();
    for token in rule.split(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        if token.is_empty()
            || token.eq_ignore_ascii_case("and")
            || token.eq_ignore_ascii_case("or")
            || genes.contains(&token)
        {
            continue;
        }
        genes.push(token);
    }
    genes
}

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Model file {0} not found")]
    FileNotFound(PathBuf),
    #[error("Unsupported model format for {0}, expected .xml, .sbml or .json")]
    UnsupportedFormat(PathBuf),
    #[error("Unable to read SBML model: {0}")]
    Sbml(#[from] SbmlError),
    #[error("Unable to read JSON model: {0}")]
    Json(#[from] JsonError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join(name)
    }

    #[test]
    fn rule_genes() {
        assert_eq!(genes_in_rule("b3916 or b1723"), vec!["b3916", "b1723"]);
        assert_eq!(
            genes_in_rule("(b1101 and b2417) or (b1101 AND b1621)"),
            vec!["b1101", "b2417", "b1621"]
        );
        assert!(genes_in_rule("").is_empty());
    }

    #[test]
    fn dispatch_on_extension() {
        let sbml = read_model(test_model("toy_model.xml")).unwrap();
        let json = read_model(test_model("toy_model.json")).unwrap();
        assert_eq!(sbml.reactions.len(), json.reactions.len());
        let sbml_ids: Vec<&String> = sbml.reactions.keys().collect();
        let json_ids: Vec<&String> = json.reactions.keys().collect();
        assert_eq!(sbml_ids, json_ids);
    }

    #[test]
    fn missing_file() {
        match read_model("data/not_a_model.xml") {
            Err(IoError::FileNotFound(path)) => {
                assert_eq!(path, PathBuf::from("data/not_a_model.xml"))
            }
            _ => panic!("Missing file not reported"),
        }
    }

    #[test]
    fn unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".mat").tempfile().unwrap();
        match read_model(file.path()) {
            Err(IoError::UnsupportedFormat(_)) => {}
            _ => panic!("Unsupported format was read"),
        }
    }
}
