//! YAML rule loader
//!
//! Load declared rules from files, directories, or strings.

use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::DeclaredRule;
use crate::engine::RuleEngine;

/// Why a rule source could not be turned into declared rules
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read rule source: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed rule YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("rejected rule: {0}")]
    Validation(String),
}

/// Parse and validate the rules in a YAML document
///
/// The document is either a single rule mapping or a sequence of them.
pub fn load_rules_from_string(yaml: &str) -> Result<Vec<DeclaredRule>, LoadError> {
    let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let rules = if document.is_sequence() {
        serde_yaml::from_value::<Vec<DeclaredRule>>(document)?
    } else {
        vec![serde_yaml::from_value::<DeclaredRule>(document)?]
    };

    rules
        .iter()
        .try_for_each(|rule| rule.validate().map_err(LoadError::Validation))?;
    Ok(rules)
}

/// Load rules from a file
pub fn load_rules_from_file(path: &Path) -> Result<Vec<DeclaredRule>, LoadError> {
    let content = fs::read_to_string(path)?;
    load_rules_from_string(&content)
}

/// Load all `.yaml`/`.yml` rules under a directory, recursively
///
/// Files are visited in name order so registration order is stable. A file
/// that fails to load is skipped with a warning.
pub fn load_rules_from_dir(dir: &Path) -> Result<Vec<DeclaredRule>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let mut rules = Vec::new();
    walk_dir(dir, &mut rules)?;
    Ok(rules)
}

fn walk_dir(dir: &Path, rules: &mut Vec<DeclaredRule>) -> Result<(), LoadError> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            walk_dir(&path, rules)?;
        } else if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                match load_rules_from_file(&path) {
                    Ok(loaded) => rules.extend(loaded),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping rule file");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Register every rule on `engine`, in order
pub fn register_rules(rules: &[DeclaredRule], engine: &mut RuleEngine) {
    for rule in rules {
        rule.register(engine);
    }
}
