//! PostgreSQL query generator.
//!
//! This module provides PostgreSQL-specific implementations:
//!
//! - [`PostgresQueryGenerator`]: catalog introspection, DDL and JSON operators
//! - enum type lifecycle (`EnumQueryGenerator`), since PostgreSQL enums are
//!   standalone catalog objects

mod dialect;
mod enums;

pub use dialect::PostgresQueryGenerator;
