//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl GeneratorConfig {
    /// Validate the generator settings.
    pub fn validate(&self) -> Result<()> {
        validation::validate_generator(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Dialect;
    use crate::error::QueryGenError;

    #[test]
    fn test_from_yaml_defaults_to_postgres() {
        let config = Config::from_yaml("generator: {}").unwrap();
        assert_eq!(config.generator.dialect, Dialect::Postgres);
        assert_eq!(config.generator.default_schema, None);
        assert_eq!(config.generator.effective_max_identifier_length(), 63);
    }

    #[test]
    fn test_from_yaml_mariadb() {
        let yaml = r#"
generator:
  dialect: mysql
  default_schema: shop
  max_identifier_length: 40
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.generator.dialect, Dialect::MariaDb);
        assert_eq!(config.generator.default_schema.as_deref(), Some("shop"));
        assert_eq!(config.generator.effective_max_identifier_length(), 40);
    }

    #[test]
    fn test_from_yaml_runs_validation() {
        let err = Config::from_yaml("generator:\n  dialect: mariadb\n").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_from_yaml_unknown_dialect() {
        let err = Config::from_yaml("generator:\n  dialect: oracle\n").unwrap_err();
        assert!(matches!(err, QueryGenError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/querygen.yaml").unwrap_err();
        assert!(matches!(err, QueryGenError::Io(_)));
    }
}
