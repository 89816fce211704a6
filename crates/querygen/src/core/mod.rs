//! Core abstractions for dialect-independent SQL generation.
//!
//! - [`traits`]: the generator contract and the enum lifecycle extension
//! - [`catalog`]: generator registry for dependency injection
//! - [`schema`]: table references, data types, column change definitions
//! - [`options`]: per-operation option bags and dialect support tables
//! - [`identifier`] / [`value`]: identifier quoting and literal escaping
//! - [`naming`]: derived index, enum and sequence names; JSON paths
//! - [`fragments`]: joining optional SQL fragments into statements
//! - [`rows`]: typed introspection result rows
//!
//! # Design Patterns
//!
//! - **Strategy**: `QueryGenerator` implementations are interchangeable
//! - **Template Method**: shared statements live in provided trait methods
//!   built on a handful of dialect primitives

pub mod catalog;
pub mod fragments;
pub mod identifier;
pub mod naming;
pub mod options;
pub mod rows;
pub mod schema;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use catalog::GeneratorCatalog;
pub use options::{
    AddValueOptions, ConstraintType, CreateEnumOptions, DialectSupports, DropTableOptions,
    ListEnumsOptions, RemoveColumnOptions, RemoveIndexOptions, ShowConstraintsOptions,
    TruncateTableOptions,
};
pub use rows::{
    ColumnDescriptionRow, ConstraintRow, EnumRow, ForeignKeyRow, IndexRow, ShowIndexRow,
    VersionRow,
};
pub use schema::{
    ChangeColumnDefinition, ChangeColumnDefinitions, ConstraintChecking, DataType, DefaultValue,
    EnumDescriptor, EscapeOptions, ForeignKeyReference, IndexRef, JsonPathSegment,
    ModelDescriptor, ReferentialAction, SqlExpression, TableName, TableReference,
};
pub use traits::{EnumQueryGenerator, QueryGenerator};
pub use value::SqlValue;
