//! Runtime configuration for the identification driver.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Options for `Identifier`. Every field has a default, so `{}` is a valid
/// config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    /// Recurse into the districts of a line-4 decomposition on the rayon pool.
    pub parallel: bool,
    /// Abort with `BudgetExhausted` once the search tree is deeper than this.
    pub max_depth: Option<usize>,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self { parallel: false, max_depth: None }
    }
}

impl IdentifyConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(IdentifyConfig::from_json_str("{}").unwrap(), IdentifyConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"parallel": true, "max_depth": 12}}"#).unwrap();
        let config = IdentifyConfig::from_json_file(file.path()).unwrap();
        assert!(config.parallel);
        assert_eq!(config.max_depth, Some(12));
    }

    #[test]
    fn test_malformed_and_missing() {
        assert!(matches!(IdentifyConfig::from_json_str("{\"parallel\": 3}"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            IdentifyConfig::from_json_file("/nonexistent/identify.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
