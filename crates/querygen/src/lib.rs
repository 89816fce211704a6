//! # querygen
//!
//! Dialect-aware SQL generation for an object-relational mapping layer.
//!
//! Each supported database has a query generator that turns abstract schema
//! operations into SQL text for that engine:
//!
//! - **Introspection**: describe a table, list constraints, indexes and
//!   foreign keys, read the server version
//! - **DDL**: drop/rename/truncate tables, drop indexes and columns, change
//!   column definitions (sequences and enum type swaps included on PostgreSQL)
//! - **Enum types**: create, drop, list and extend PostgreSQL enums
//! - **JSON**: path extraction and unquoting expressions
//!
//! Generators never execute anything. [`QueryInterfaceInternal`] runs the
//! generated introspection statements through a caller-supplied executor.
//!
//! ## Example
//!
//! ```rust
//! use querygen::core::{QueryGenerator, RemoveIndexOptions};
//! use querygen::{Config, GeneratorCatalog};
//!
//! # fn main() -> querygen::Result<()> {
//! let config = Config::from_yaml("generator:\n  dialect: postgres\n")?;
//! let catalog = GeneratorCatalog::from_config(&config.generator)?;
//! let pg = catalog.require("postgres")?;
//!
//! let sql = pg.remove_index_query(
//!     &"users".into(),
//!     &vec!["email"].into(),
//!     &RemoveIndexOptions { if_exists: true, ..Default::default() },
//! )?;
//! assert_eq!(sql, "DROP INDEX IF EXISTS \"public\".\"users_email\";");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod query_interface;

// Re-exports for convenient access
pub use crate::core::{EnumQueryGenerator, GeneratorCatalog, QueryGenerator};
pub use config::{Config, GeneratorConfig};
pub use drivers::{Dialect, MariaDbQueryGenerator, PostgresQueryGenerator};
pub use error::{QueryGenError, Result};
pub use query_interface::{QueryInterfaceInternal, RawQueryExecutor, Row};
