//! Generator catalog for explicit dependency injection.
//!
//! The [`GeneratorCatalog`] maps dialect tags to query generators. It is
//! constructed explicitly and handed to callers instead of living in a global,
//! so tests can register mock generators next to (or instead of) the built-in
//! ones.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::GeneratorConfig;
use crate::drivers::{Dialect, MariaDbQueryGenerator, PostgresQueryGenerator};
use crate::error::{QueryGenError, Result};

use super::traits::QueryGenerator;

/// Registry of query generators by dialect tag.
///
/// # Example
///
/// ```rust
/// use querygen::core::GeneratorCatalog;
///
/// let catalog = GeneratorCatalog::with_builtins("shop");
/// let pg = catalog.require("postgres").unwrap();
/// assert_eq!(pg.version_query().unwrap(), "SHOW SERVER_VERSION");
/// ```
#[derive(Default)]
pub struct GeneratorCatalog {
    generators: HashMap<String, Arc<dyn QueryGenerator>>,
}

impl GeneratorCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with both built-in dialects registered.
    ///
    /// MariaDB has no schema separate from the database, so its generator
    /// needs the database name up front.
    pub fn with_builtins(mariadb_database: impl Into<String>) -> Self {
        let mut catalog = Self::new();
        catalog.register(
            Dialect::MariaDb.name(),
            MariaDbQueryGenerator::new(mariadb_database),
        );
        catalog.register(Dialect::Postgres.name(), PostgresQueryGenerator::new());
        info!("Registered built-in query generators: mariadb, postgres");
        catalog
    }

    /// Build a single generator for the configured dialect.
    ///
    /// The config is validated first, so code-built configs get the same
    /// checks as loaded ones.
    pub fn generator_from_config(config: &GeneratorConfig) -> Result<Arc<dyn QueryGenerator>> {
        config.validate()?;
        let max = config.effective_max_identifier_length();
        let generator: Arc<dyn QueryGenerator> = match config.dialect {
            Dialect::MariaDb => {
                let database = config.default_schema.clone().ok_or_else(|| {
                    QueryGenError::Config(
                        "mariadb requires default_schema (the database name)".into(),
                    )
                })?;
                Arc::new(MariaDbQueryGenerator::new(database).with_max_identifier_length(max))
            }
            Dialect::Postgres => {
                let mut generator = PostgresQueryGenerator::new().with_max_identifier_length(max);
                if let Some(schema) = &config.default_schema {
                    generator = generator.with_default_schema(schema.clone());
                }
                Arc::new(generator)
            }
        };
        info!(
            "Query generator: {} (default schema {}, identifier limit {})",
            generator.name(),
            generator.default_schema(),
            max
        );
        Ok(generator)
    }

    /// Create a catalog holding only the configured dialect.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.register_arc(config.dialect.name(), Self::generator_from_config(config)?);
        Ok(catalog)
    }

    /// Register a generator by name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        generator: impl QueryGenerator + 'static,
    ) {
        self.generators.insert(name.into(), Arc::new(generator));
    }

    /// Register a generator as an Arc (for sharing).
    pub fn register_arc(&mut self, name: impl Into<String>, generator: Arc<dyn QueryGenerator>) {
        self.generators.insert(name.into(), generator);
    }

    /// Get a generator by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn QueryGenerator>> {
        self.generators.get(name).cloned()
    }

    /// Get a generator by name or alias, returning an error if not found.
    pub fn require(&self, name: &str) -> Result<Arc<dyn QueryGenerator>> {
        if let Some(generator) = self.get(name) {
            return Ok(generator);
        }
        // Aliases resolve to the canonical tag
        let canonical = Dialect::from_db_type(name)
            .map_err(|_| QueryGenError::Config(format!("Unknown query dialect: {}", name)))?;
        self.get(canonical.name()).ok_or_else(|| {
            QueryGenError::Config(format!("No query generator registered for {}", canonical))
        })
    }

    /// Check if a dialect is registered.
    pub fn has(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Get all registered dialect names.
    pub fn dialect_names(&self) -> Vec<&str> {
        self.generators.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for GeneratorCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorCatalog")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
