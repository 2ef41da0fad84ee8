//! Loading specifications and configurations from JSON or YAML files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use argtree_core::{CommandDef, ConfigError, ParserConfig, ParserConfigBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Reads a document, choosing YAML for `.yaml`/`.yml` files and JSON
/// otherwise.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let reader = BufReader::new(File::open(path)?);
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_reader(reader)?)
    } else {
        Ok(serde_json::from_reader(reader)?)
    }
}

pub fn load_spec(path: &Path) -> Result<CommandDef, LoadError> {
    load_document(path)
}

/// Loads and validates a configuration; no path means the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ParserConfig, LoadError> {
    let builder: ParserConfigBuilder = match path {
        Some(path) => load_document(path)?,
        None => ParserConfigBuilder::default(),
    };
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_loads_yaml_and_json_specs() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("spec.yaml");
        fs::write(
            &yaml,
            "name: git\noptions:\n  - name: verbose\n    kind: flag\n    short: [v]\n",
        )
        .unwrap();
        let json = dir.path().join("spec.json");
        let spec = r#"{"name": "git", "options": [
            {"name": "verbose", "kind": "flag", "short": ["v"]}
        ]}"#;
        fs::write(&json, spec).unwrap();

        assert_eq!(load_spec(&yaml).unwrap(), load_spec(&json).unwrap());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "max_argfile_depth: 0\n").unwrap();

        assert!(matches!(load_config(Some(&path)), Err(LoadError::Config(_))));
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn test_unknown_config_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"allow_abbreviatons": true}"#).unwrap();

        assert!(matches!(load_config(Some(&path)), Err(LoadError::Json(_))));
    }
}
