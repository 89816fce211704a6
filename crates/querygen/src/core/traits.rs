//! Core traits for dialect-specific SQL generation.
//!
//! - [`QueryGenerator`]: the full operation surface every dialect exposes
//! - [`EnumQueryGenerator`]: lifecycle of standalone enum types, only for
//!   dialects where enums are catalog objects
//!
//! # Design Patterns
//!
//! - **Strategy**: one generator per dialect, selected at startup
//! - **Template Method**: provided methods build shared statements on top of
//!   the few primitives a dialect must supply (quoting, escaping, defaults)

use tracing::debug;

use crate::error::{QueryGenError, Result};
use crate::fragments;

use super::fragments::join_sql_fragments;
use super::identifier::validate_identifier;
use super::naming::generate_index_name;
use super::options::{
    check_options, AddValueOptions, CreateEnumOptions, DialectSupports, DropTableOptions,
    ListEnumsOptions, RemoveColumnOptions, RemoveIndexOptions, ShowConstraintsOptions,
    TruncateTableOptions,
};
use super::schema::{
    ChangeColumnDefinitions, ConstraintChecking, DataType, EnumDescriptor, EscapeOptions,
    IndexRef, JsonPathSegment, SqlExpression, TableName, TableReference,
};
use super::value::SqlValue;

/// SQL generation strategy for one database dialect.
///
/// Every operation returns the SQL text; nothing is executed. Operations that
/// only make sense on some engines default to [`QueryGenError::Unsupported`].
///
/// Generators hold no mutable state and are shared as
/// `Arc<dyn QueryGenerator>`.
pub trait QueryGenerator: Send + Sync {
    // ===== Dialect primitives =====

    /// Dialect tag (e.g. "mariadb", "postgres").
    fn name(&self) -> &'static str;

    /// Quote an identifier (table name, column name, etc.).
    ///
    /// - MariaDB: `` `identifier` ``
    /// - PostgreSQL: `"identifier"`
    fn quote_identifier(&self, name: &str) -> String;

    /// Escape a literal value.
    fn escape(&self, value: &SqlValue<'_>) -> String;

    /// Schema used when a table reference does not name one.
    fn default_schema(&self) -> &str;

    /// Option keys this dialect implements, per operation.
    fn supports(&self) -> &DialectSupports;

    /// Longest identifier the engine keeps without truncation.
    fn max_identifier_length(&self) -> usize;

    /// Render an abstract column type.
    fn data_type_sql(&self, data_type: &DataType) -> Result<String>;

    // ===== Shared helpers =====

    /// Resolve a table name, filling the default schema.
    fn extract_table_details(&self, table: &TableName) -> Result<TableReference> {
        validate_identifier(&table.table_name)?;
        let schema = match &table.schema {
            Some(schema) => {
                validate_identifier(schema)?;
                schema.clone()
            }
            None => self.default_schema().to_string(),
        };
        Ok(TableReference {
            table_name: table.table_name.clone(),
            schema,
        })
    }

    /// Quote a resolved table as `schema.table`.
    fn quote_table(&self, table: &TableReference) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(&table.schema),
            self.quote_identifier(&table.table_name)
        )
    }

    /// Escape a string as a literal.
    fn escape_str(&self, s: &str) -> String {
        self.escape(&SqlValue::text(s))
    }

    /// Escape an expression argument: raw SQL passes through unchanged.
    fn escape_expression(&self, expr: &SqlExpression<'_>) -> String {
        match expr {
            SqlExpression::Raw(sql) => sql.clone(),
            SqlExpression::Value(value) => self.escape(value),
        }
    }

    /// Name of the index referenced by `index`.
    fn index_name(&self, table: &TableReference, index: &IndexRef) -> Result<String> {
        let name = match index {
            IndexRef::Name(name) => name.clone(),
            IndexRef::Fields(fields) => {
                if fields.is_empty() {
                    return Err(QueryGenError::Config(
                        "An index must reference at least one column".into(),
                    ));
                }
                generate_index_name(table, fields, self.max_identifier_length())
            }
        };
        validate_identifier(&name)?;
        Ok(name)
    }

    /// Fail with `Unsupported` for this dialect.
    fn unsupported(&self, operation: &str) -> QueryGenError {
        QueryGenError::unsupported(operation, self.name())
    }

    // ===== Introspection =====

    /// Column metadata: name, type, nullability, default, enum labels, comment.
    fn describe_table_query(&self, table: &TableName) -> Result<String> {
        let table = self.extract_table_details(table)?;
        Ok(format!("SHOW FULL COLUMNS FROM {};", self.quote_table(&table)))
    }

    /// Constraint rows, ordered by constraint name.
    fn show_constraints_query(
        &self,
        _table: &TableName,
        _options: &ShowConstraintsOptions,
    ) -> Result<String> {
        Err(self.unsupported("show_constraints_query"))
    }

    /// Index rows.
    fn show_indexes_query(&self, _table: &TableName) -> Result<String> {
        Err(self.unsupported("show_indexes_query"))
    }

    /// One row per foreign-key column pair, optionally for a single column.
    fn get_foreign_key_query(&self, _table: &TableName, _column: Option<&str>) -> Result<String> {
        Err(self.unsupported("get_foreign_key_query"))
    }

    /// Check whether a base table exists.
    fn table_exists_query(&self, table: &TableName) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let sql = format!(
            "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND TABLE_TYPE = 'BASE TABLE';",
            self.escape_str(&table.schema),
            self.escape_str(&table.table_name)
        );
        debug!("{} table_exists_query: {}", self.name(), sql);
        Ok(sql)
    }

    /// Query returning one row with the server version.
    fn version_query(&self) -> Result<String> {
        Err(self.unsupported("version_query"))
    }

    /// Column of the version query result holding the version string.
    fn version_field(&self) -> &'static str {
        "version"
    }

    // ===== DDL =====

    /// Drop an index by name or by the columns it was created on.
    fn remove_index_query(
        &self,
        _table: &TableName,
        _index: &IndexRef,
        _options: &RemoveIndexOptions,
    ) -> Result<String> {
        Err(self.unsupported("remove_index_query"))
    }

    /// Drop a foreign key constraint.
    fn drop_foreign_key_query(&self, table: &TableName, constraint: &str) -> Result<String> {
        let table = self.extract_table_details(table)?;
        validate_identifier(constraint)?;
        Ok(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {};",
            self.quote_table(&table),
            self.quote_identifier(constraint)
        ))
    }

    /// Drop a table if it exists.
    fn drop_table_query(&self, table: &TableName, options: &DropTableOptions) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;
        let sql = join_sql_fragments(fragments![
            "DROP TABLE IF EXISTS",
            self.quote_table(&table),
            options.cascade.then_some("CASCADE"),
            ";",
        ]);
        debug!("{} drop_table_query: {}", self.name(), sql);
        Ok(sql)
    }

    /// Rename a table within its schema.
    fn rename_table_query(&self, before: &TableName, after: &TableName) -> Result<String> {
        let before = self.extract_table_details(before)?;
        let after = self.extract_table_details(after)?;
        if before.schema != after.schema {
            return Err(QueryGenError::Config(format!(
                "Cannot move table {} to schema {} while renaming it",
                before.table_name, after.schema
            )));
        }
        Ok(format!(
            "ALTER TABLE {} RENAME TO {};",
            self.quote_table(&before),
            self.quote_identifier(&after.table_name)
        ))
    }

    /// Remove every row from a table.
    fn truncate_table_query(
        &self,
        table: &TableName,
        options: &TruncateTableOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;
        Ok(join_sql_fragments(fragments![
            "TRUNCATE",
            self.quote_table(&table),
            options.restart_identity.then_some("RESTART IDENTITY"),
            options.cascade.then_some("CASCADE"),
            ";",
        ]))
    }

    /// Drop a column.
    fn remove_column_query(
        &self,
        table: &TableName,
        column: &str,
        options: &RemoveColumnOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;
        validate_identifier(column)?;
        let sql = join_sql_fragments(fragments![
            "ALTER TABLE",
            self.quote_table(&table),
            "DROP COLUMN",
            options.if_exists.then_some("IF EXISTS"),
            self.quote_identifier(column),
            options.cascade.then_some("CASCADE"),
            ";",
        ]);
        debug!("{} remove_column_query: {}", self.name(), sql);
        Ok(sql)
    }

    /// Alter one or more columns of a table.
    fn change_columns_query(
        &self,
        _table: &TableName,
        _columns: &ChangeColumnDefinitions,
    ) -> Result<String> {
        Err(self.unsupported("change_columns_query"))
    }

    // ===== Session =====

    /// Enable or disable foreign key enforcement for the session.
    fn get_toggle_foreign_key_checks_query(&self, _enable: bool) -> Result<String> {
        Err(self.unsupported("get_toggle_foreign_key_checks_query"))
    }

    /// Defer or un-defer constraint checking in the current transaction.
    fn set_constraint_checking_query(&self, _checking: &ConstraintChecking) -> Result<String> {
        Err(self.unsupported("set_constraint_checking_query"))
    }

    // ===== JSON =====

    /// Extract the value at `path` from a JSON expression.
    ///
    /// `sql_expression` is embedded verbatim; the path must be non-empty.
    fn json_path_extraction_query(
        &self,
        _sql_expression: &str,
        _path: &[JsonPathSegment],
        _unquote: bool,
    ) -> Result<String> {
        Err(self.unsupported("json_path_extraction_query"))
    }

    /// Wrap a JSON text expression so it yields an unquoted scalar.
    fn format_unquote_json(
        &self,
        _arg: &SqlExpression<'_>,
        _options: EscapeOptions,
    ) -> Result<String> {
        Err(self.unsupported("format_unquote_json"))
    }

    // ===== Capabilities =====

    /// Enum lifecycle operations, for dialects with standalone enum types.
    fn as_enum_generator(&self) -> Option<&dyn EnumQueryGenerator> {
        None
    }
}

/// Lifecycle of named enum types stored as catalog objects.
pub trait EnumQueryGenerator: Send + Sync {
    /// Create an enum type, ignoring "already exists".
    ///
    /// `data_type` must be an ENUM (or array of ENUM).
    fn create_enum_query(
        &self,
        name: &TableName,
        data_type: &DataType,
        options: &CreateEnumOptions,
    ) -> Result<String>;

    /// Create the enum type a descriptor names, with its labels.
    fn create_enum_from_descriptor(
        &self,
        descriptor: &EnumDescriptor,
        options: &CreateEnumOptions,
    ) -> Result<String> {
        self.create_enum_query(&descriptor.name, &descriptor.data_type(), options)
    }

    /// Drop an enum type if it exists.
    fn drop_enum_query(&self, name: &TableName) -> Result<String>;

    /// Enum type names with their ordered labels.
    fn list_enums_query(&self, options: &ListEnumsOptions) -> Result<String>;

    /// Add a label to an enum type unless it is already present.
    fn add_value_to_enum_query(
        &self,
        name: &TableName,
        value: &str,
        options: &AddValueOptions,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifier::quote_pg;
    use crate::core::value::escape_pg;

    const MOCK_SUPPORTS: DialectSupports = DialectSupports {
        drop_table: &["cascade"],
        ..DialectSupports::NONE
    };

    // Mock generator relying on every provided default
    struct MockGenerator;

    impl QueryGenerator for MockGenerator {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn quote_identifier(&self, name: &str) -> String {
            quote_pg(name)
        }

        fn escape(&self, value: &SqlValue<'_>) -> String {
            escape_pg(value)
        }

        fn default_schema(&self) -> &str {
            "main"
        }

        fn supports(&self) -> &DialectSupports {
            &MOCK_SUPPORTS
        }

        fn max_identifier_length(&self) -> usize {
            20
        }

        fn data_type_sql(&self, _data_type: &DataType) -> Result<String> {
            Ok("TEXT".into())
        }
    }

    #[test]
    fn test_extract_table_details_fills_default_schema() {
        let table = MockGenerator
            .extract_table_details(&TableName::new("users"))
            .unwrap();
        assert_eq!(table.schema, "main");
        assert_eq!(table.table_name, "users");

        let table = MockGenerator
            .extract_table_details(&"audit.events".into())
            .unwrap();
        assert_eq!(table.schema, "audit");
    }

    #[test]
    fn test_extract_table_details_rejects_bad_identifiers() {
        assert!(MockGenerator
            .extract_table_details(&TableName::new(""))
            .is_err());
        assert!(MockGenerator
            .extract_table_details(&TableName::with_schema("a\0b", "users"))
            .is_err());
    }

    #[test]
    fn test_index_name_from_fields_matches_explicit_name() {
        let table = MockGenerator
            .extract_table_details(&TableName::new("users"))
            .unwrap();
        let derived = MockGenerator
            .index_name(&table, &IndexRef::from(vec!["email"]))
            .unwrap();
        assert_eq!(derived, "users_email");
        let explicit = MockGenerator
            .index_name(&table, &IndexRef::from("users_email"))
            .unwrap();
        assert_eq!(derived, explicit);
    }

    #[test]
    fn test_index_name_respects_dialect_limit() {
        let table = MockGenerator
            .extract_table_details(&TableName::new("users"))
            .unwrap();
        let name = MockGenerator
            .index_name(&table, &IndexRef::from(vec!["first_name", "last_name"]))
            .unwrap();
        assert_eq!(name.len(), 20);
        assert!(MockGenerator
            .index_name(&table, &IndexRef::Fields(vec![]))
            .is_err());
    }

    #[test]
    fn test_engine_specific_defaults_are_unsupported() {
        let table = TableName::new("users");
        let err = MockGenerator.show_indexes_query(&table).unwrap_err();
        assert!(matches!(err, QueryGenError::Unsupported { .. }));
        assert!(err.to_string().contains("mock"));
        assert!(MockGenerator.version_query().is_err());
        assert!(MockGenerator
            .get_toggle_foreign_key_checks_query(true)
            .is_err());
        assert!(MockGenerator.as_enum_generator().is_none());
        assert_eq!(MockGenerator.version_field(), "version");
    }

    #[test]
    fn test_default_describe_table() {
        let sql = MockGenerator
            .describe_table_query(&TableName::new("users"))
            .unwrap();
        assert_eq!(sql, "SHOW FULL COLUMNS FROM \"main\".\"users\";");
    }

    #[test]
    fn test_drop_table_validates_options() {
        let sql = MockGenerator
            .drop_table_query(&"users".into(), &DropTableOptions { cascade: true })
            .unwrap();
        assert_eq!(sql, "DROP TABLE IF EXISTS \"main\".\"users\" CASCADE;");

        let err = MockGenerator
            .truncate_table_query(
                &"users".into(),
                &TruncateTableOptions {
                    restart_identity: true,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("restart_identity"));
    }

    #[test]
    fn test_rename_table_rejects_schema_move() {
        let sql = MockGenerator
            .rename_table_query(&"users".into(), &"people".into())
            .unwrap();
        assert_eq!(sql, "ALTER TABLE \"main\".\"users\" RENAME TO \"people\";");

        let err = MockGenerator
            .rename_table_query(&"users".into(), &"archive.users".into())
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_table_exists_escapes_names() {
        let sql = MockGenerator
            .table_exists_query(&"o'brien".into())
            .unwrap();
        assert!(sql.contains("TABLE_NAME = 'o''brien'"));
        assert!(sql.contains("TABLE_SCHEMA = 'main'"));
    }
}
