//! Per-operation option bags and dialect support tables.
//!
//! Every options-taking operation declares the full set of option keys it
//! understands (`supportable`); each dialect declares the subset it actually
//! implements (`supported`). A call that sets an option outside the dialect's
//! subset is rejected before any SQL is built, listing every offending key.

use std::fmt;

use crate::error::{QueryGenError, Result};

/// Operations that accept an option bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionOperation {
    RemoveIndex,
    ShowConstraints,
    DropTable,
    TruncateTable,
    RemoveColumn,
    CreateEnum,
    ListEnums,
    AddValueToEnum,
}

impl OptionOperation {
    /// Operation name as reported in errors.
    pub fn name(&self) -> &'static str {
        match self {
            OptionOperation::RemoveIndex => "remove_index_query",
            OptionOperation::ShowConstraints => "show_constraints_query",
            OptionOperation::DropTable => "drop_table_query",
            OptionOperation::TruncateTable => "truncate_table_query",
            OptionOperation::RemoveColumn => "remove_column_query",
            OptionOperation::CreateEnum => "create_enum_query",
            OptionOperation::ListEnums => "list_enums_query",
            OptionOperation::AddValueToEnum => "add_value_to_enum_query",
        }
    }

    /// Every option key the operation understands on some dialect.
    pub fn supportable(&self) -> &'static [&'static str] {
        match self {
            OptionOperation::RemoveIndex => &["if_exists", "cascade", "concurrently"],
            OptionOperation::ShowConstraints => {
                &["column_name", "constraint_name", "constraint_type"]
            }
            OptionOperation::DropTable => &["cascade"],
            OptionOperation::TruncateTable => &["cascade", "restart_identity"],
            OptionOperation::RemoveColumn => &["if_exists", "cascade"],
            OptionOperation::CreateEnum => &["force"],
            OptionOperation::ListEnums => &["schema", "data_type"],
            OptionOperation::AddValueToEnum => &["before", "after"],
        }
    }
}

impl fmt::Display for OptionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which option keys a dialect implements, per operation.
#[derive(Debug, Clone, Copy)]
pub struct DialectSupports {
    pub remove_index: &'static [&'static str],
    pub show_constraints: &'static [&'static str],
    pub drop_table: &'static [&'static str],
    pub truncate_table: &'static [&'static str],
    pub remove_column: &'static [&'static str],
    pub create_enum: &'static [&'static str],
    pub list_enums: &'static [&'static str],
    pub add_value_to_enum: &'static [&'static str],
}

impl DialectSupports {
    /// Nothing beyond the required arguments.
    pub const NONE: DialectSupports = DialectSupports {
        remove_index: &[],
        show_constraints: &[],
        drop_table: &[],
        truncate_table: &[],
        remove_column: &[],
        create_enum: &[],
        list_enums: &[],
        add_value_to_enum: &[],
    };

    /// Supported keys for an operation.
    pub fn for_operation(&self, operation: OptionOperation) -> &'static [&'static str] {
        match operation {
            OptionOperation::RemoveIndex => self.remove_index,
            OptionOperation::ShowConstraints => self.show_constraints,
            OptionOperation::DropTable => self.drop_table,
            OptionOperation::TruncateTable => self.truncate_table,
            OptionOperation::RemoveColumn => self.remove_column,
            OptionOperation::CreateEnum => self.create_enum,
            OptionOperation::ListEnums => self.list_enums,
            OptionOperation::AddValueToEnum => self.add_value_to_enum,
        }
    }
}

impl Default for DialectSupports {
    fn default() -> Self {
        Self::NONE
    }
}

/// An option bag that can report which of its keys were set.
pub trait QueryOptions {
    /// Operation these options belong to.
    fn operation(&self) -> OptionOperation;

    /// Keys of the options the caller set, in declaration order.
    fn provided(&self) -> Vec<&'static str>;
}

/// Return the provided keys the dialect does not support.
///
/// A key is a violation when it is outside `supportable` (unknown to the
/// operation) or outside `supported` (unknown to the dialect). Order follows
/// `provided`.
pub fn find_invalid_options(
    supportable: &[&str],
    supported: &[&str],
    provided: &[&str],
) -> Vec<String> {
    provided
        .iter()
        .filter(|key| !(supportable.contains(key) && supported.contains(key)))
        .map(|key| key.to_string())
        .collect()
}

/// Fail with [`QueryGenError::InvalidOptions`] if any provided key is invalid.
pub fn reject_invalid_options(
    operation: &str,
    dialect: &str,
    supportable: &[&str],
    supported: &[&str],
    provided: &[&str],
) -> Result<()> {
    let invalid = find_invalid_options(supportable, supported, provided);
    if invalid.is_empty() {
        return Ok(());
    }
    Err(QueryGenError::InvalidOptions {
        operation: operation.to_string(),
        dialect: dialect.to_string(),
        options: invalid,
    })
}

/// Validate an option bag against a dialect's support table.
pub fn check_options(
    dialect: &str,
    supports: &DialectSupports,
    options: &dyn QueryOptions,
) -> Result<()> {
    let operation = options.operation();
    reject_invalid_options(
        operation.name(),
        dialect,
        operation.supportable(),
        supports.for_operation(operation),
        &options.provided(),
    )
}

fn keys(flags: &[(&'static str, bool)]) -> Vec<&'static str> {
    flags
        .iter()
        .filter(|(_, set)| *set)
        .map(|(key, _)| *key)
        .collect()
}

/// Options for `remove_index_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveIndexOptions {
    pub if_exists: bool,
    pub cascade: bool,
    pub concurrently: bool,
}

impl QueryOptions for RemoveIndexOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::RemoveIndex
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[
            ("if_exists", self.if_exists),
            ("cascade", self.cascade),
            ("concurrently", self.concurrently),
        ])
    }
}

/// Constraint kinds that `show_constraints_query` can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    Check,
    ForeignKey,
    PrimaryKey,
    Unique,
}

impl ConstraintType {
    /// Value of `CONSTRAINT_TYPE` in information_schema.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ConstraintType::Check => "CHECK",
            ConstraintType::ForeignKey => "FOREIGN KEY",
            ConstraintType::PrimaryKey => "PRIMARY KEY",
            ConstraintType::Unique => "UNIQUE",
        }
    }
}

/// Filters for `show_constraints_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowConstraintsOptions {
    pub column_name: Option<String>,
    pub constraint_name: Option<String>,
    pub constraint_type: Option<ConstraintType>,
}

impl QueryOptions for ShowConstraintsOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::ShowConstraints
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[
            ("column_name", self.column_name.is_some()),
            ("constraint_name", self.constraint_name.is_some()),
            ("constraint_type", self.constraint_type.is_some()),
        ])
    }
}

/// Options for `drop_table_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropTableOptions {
    pub cascade: bool,
}

impl QueryOptions for DropTableOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::DropTable
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[("cascade", self.cascade)])
    }
}

/// Options for `truncate_table_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TruncateTableOptions {
    pub cascade: bool,
    pub restart_identity: bool,
}

impl QueryOptions for TruncateTableOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::TruncateTable
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[
            ("cascade", self.cascade),
            ("restart_identity", self.restart_identity),
        ])
    }
}

/// Options for `remove_column_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveColumnOptions {
    pub if_exists: bool,
    pub cascade: bool,
}

impl QueryOptions for RemoveColumnOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::RemoveColumn
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[("if_exists", self.if_exists), ("cascade", self.cascade)])
    }
}

/// Options for `create_enum_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEnumOptions {
    /// Drop any existing type of the same name first.
    pub force: bool,
}

impl QueryOptions for CreateEnumOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::CreateEnum
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[("force", self.force)])
    }
}

/// Filters for `list_enums_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEnumsOptions {
    /// Schema to list; the dialect default when unset.
    pub schema: Option<String>,

    /// Restrict to a single enum type name.
    pub data_type: Option<String>,
}

impl QueryOptions for ListEnumsOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::ListEnums
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[
            ("schema", self.schema.is_some()),
            ("data_type", self.data_type.is_some()),
        ])
    }
}

/// Position for `add_value_to_enum_query`.
///
/// If both are set, `before` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddValueOptions {
    pub before: Option<String>,
    pub after: Option<String>,
}

impl QueryOptions for AddValueOptions {
    fn operation(&self) -> OptionOperation {
        OptionOperation::AddValueToEnum
    }

    fn provided(&self) -> Vec<&'static str> {
        keys(&[
            ("before", self.before.is_some()),
            ("after", self.after.is_some()),
        ])
    }
}
