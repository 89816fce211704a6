//! Configuration validation.

use super::{Config, GeneratorConfig};
use crate::core::identifier::{validate_identifier, MAX_IDENTIFIER_LENGTH};
use crate::core::naming::MIN_HASHED_IDENTIFIER_LENGTH;
use crate::drivers::Dialect;
use crate::error::{QueryGenError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_generator(&config.generator)
}

/// Validate the generator section on its own.
pub fn validate_generator(generator: &GeneratorConfig) -> Result<()> {
    match (&generator.default_schema, generator.dialect) {
        (Some(schema), _) => validate_identifier(schema).map_err(|e| {
            QueryGenError::Config(format!("generator.default_schema is invalid: {}", e))
        })?,
        (None, Dialect::MariaDb) => {
            return Err(QueryGenError::Config(
                "generator.default_schema (the database name) is required for mariadb".into(),
            ));
        }
        (None, Dialect::Postgres) => {}
    }

    if let Some(max) = generator.max_identifier_length {
        if !(MIN_HASHED_IDENTIFIER_LENGTH..=MAX_IDENTIFIER_LENGTH).contains(&max) {
            return Err(QueryGenError::Config(format!(
                "generator.max_identifier_length must be between {} and {}, got {}",
                MIN_HASHED_IDENTIFIER_LENGTH, MAX_IDENTIFIER_LENGTH, max
            )));
        }
    }

    Ok(())
}
