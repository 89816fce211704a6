//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::drivers::Dialect;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Query generator selection.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Which dialect to generate SQL for, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Target dialect (default: postgres).
    #[serde(default)]
    pub dialect: Dialect,

    /// Schema used when a table name carries none.
    ///
    /// PostgreSQL falls back to `public`. MariaDB has no schema separate
    /// from the database, so the database name is required.
    #[serde(default)]
    pub default_schema: Option<String>,

    /// Override for the identifier length used by name generation.
    #[serde(default)]
    pub max_identifier_length: Option<usize>,
}

impl GeneratorConfig {
    /// Create a configuration for a dialect with its defaults.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Set the default schema.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Set the identifier length override.
    #[must_use]
    pub fn with_max_identifier_length(mut self, max: usize) -> Self {
        self.max_identifier_length = Some(max);
        self
    }

    /// Identifier limit in effect: the override, else the dialect's own.
    pub fn effective_max_identifier_length(&self) -> usize {
        self.max_identifier_length
            .unwrap_or_else(|| self.dialect.max_identifier_length())
    }
}
