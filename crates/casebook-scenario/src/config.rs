//! Configuration for evidence validation.
//!
//! Loaded from TOML, either as top-level keys or under an `[evidence]` table:
//!
//! ```toml
//! [evidence]
//! marginal_tolerance = 1e-6
//! point_tolerance = 1e-9
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Value out of range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Tolerances used when validating evidence and marginals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Allowed distance between a marginal distribution's total and 1.0
    /// Default: 1e-6
    pub marginal_tolerance: f64,

    /// Allowed distance between a number and a discrete real state's value
    /// Default: 1e-9
    pub point_tolerance: f64,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            marginal_tolerance: 1e-6,
            point_tolerance: 1e-9,
        }
    }
}

impl EvidenceConfig {
    /// Exact matching: tight totals, numbers must equal point states
    pub fn strict() -> Self {
        Self {
            marginal_tolerance: 1e-9,
            point_tolerance: 0.0,
        }
    }

    /// Loose matching for marginals produced by approximate engines
    pub fn lenient() -> Self {
        Self {
            marginal_tolerance: 1e-3,
            point_tolerance: 1e-6,
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let document: toml::Value = toml::from_str(contents)?;
        let section = match document.get("evidence") {
            Some(section) => section.clone(),
            None => document,
        };

        let config: EvidenceConfig = section.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check that every tolerance is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.marginal_tolerance.is_finite() || self.marginal_tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "marginal_tolerance must be a positive number, got {}",
                self.marginal_tolerance
            )));
        }
        if !self.point_tolerance.is_finite() || self.point_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "point_tolerance must be a non-negative number, got {}",
                self.point_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EvidenceConfig::default();
        assert_eq!(config.marginal_tolerance, 1e-6);
        assert_eq!(config.point_tolerance, 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EvidenceConfig::strict().validate().is_ok());
        assert!(EvidenceConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_parse_section() {
        let toml = r#"
            [evidence]
            marginal_tolerance = 0.001
        "#;

        let config = EvidenceConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.marginal_tolerance, 0.001);
        assert_eq!(config.point_tolerance, 1e-9);
    }

    #[test]
    fn test_parse_top_level() {
        let config = EvidenceConfig::from_toml_str("point_tolerance = 0.5").unwrap();
        assert_eq!(config.point_tolerance, 0.5);
        assert_eq!(config.marginal_tolerance, 1e-6);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = EvidenceConfig::from_toml_str("other = \"value\"").unwrap();
        assert_eq!(config, EvidenceConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let result = EvidenceConfig::from_toml_str("marginal_tolerance = -1.0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = EvidenceConfig::from_toml_str("marginal_tolerance = \"tiny\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[evidence]\nmarginal_tolerance = 0.01").unwrap();

        let config = EvidenceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.marginal_tolerance, 0.01);
    }

    #[test]
    fn test_missing_file() {
        let result = EvidenceConfig::from_file("/nonexistent/casebook.toml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
