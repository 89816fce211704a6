//! MariaDB/MySQL query generator.
//!
//! Introspection goes through `INFORMATION_SCHEMA`; composite foreign keys
//! come back as one row per column. Enums are column types here, not catalog
//! objects, so this dialect has no enum lifecycle.
//!
//! # Supported Versions
//!
//! - MariaDB 10.4+ (`CHECK_CONSTRAINTS.TABLE_NAME`, `DROP INDEX IF EXISTS`)
//! - MySQL 8.0+ for everything except the CHECK join

mod dialect;

pub use dialect::MariaDbQueryGenerator;
