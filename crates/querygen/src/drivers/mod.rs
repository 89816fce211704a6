//! Dialect-specific query generators.
//!
//! - [`mariadb`]: MariaDB / MySQL family (information_schema catalog)
//! - [`postgres`]: PostgreSQL family (pg_catalog, standalone enum types)
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` (e.g., `drivers/sqlite/`)
//! 2. Implement `QueryGenerator` (and `EnumQueryGenerator` if the engine has
//!    standalone enum types)
//! 3. Add a variant to [`Dialect`] and register it in
//!    `GeneratorCatalog::with_builtins()`

pub mod mariadb;
pub mod postgres;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryGenError, Result};

pub use mariadb::MariaDbQueryGenerator;
pub use postgres::PostgresQueryGenerator;

/// Supported dialect tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mysql")]
    MariaDb,
    #[default]
    #[serde(alias = "pg", alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// All built-in dialects.
    pub const ALL: [Dialect; 2] = [Dialect::MariaDb, Dialect::Postgres];

    /// Canonical tag.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MariaDb => "mariadb",
            Dialect::Postgres => "postgres",
        }
    }

    /// Identifier length the engine keeps without truncation.
    pub fn max_identifier_length(&self) -> usize {
        match self {
            Dialect::MariaDb => 64,
            Dialect::Postgres => 63,
        }
    }

    /// Parse a dialect tag, accepting the usual aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "mariadb" | "mysql" => Ok(Dialect::MariaDb),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(QueryGenError::Config(format!(
                "Unknown database type: '{}'. Supported types: mariadb, postgres",
                other
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
