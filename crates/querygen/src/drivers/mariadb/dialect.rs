//! MariaDB SQL generation (Strategy pattern).

use tracing::debug;

use crate::core::fragments::{join_sql_fragments, Fragment};
use crate::core::identifier::{quote_mariadb, validate_identifier};
use crate::core::naming::build_json_path;
use crate::core::options::{
    check_options, DialectSupports, RemoveIndexOptions, ShowConstraintsOptions,
};
use crate::core::schema::{
    normalize_change_columns, ChangeColumnDefinition, ChangeColumnDefinitions, DataType,
    DefaultValue, EscapeOptions, ForeignKeyReference, IndexRef, JsonPathSegment, SqlExpression,
    TableName, TableReference,
};
use crate::core::traits::QueryGenerator;
use crate::core::value::{escape_mariadb, SqlValue};
use crate::drivers::Dialect;
use crate::error::{QueryGenError, Result};
use crate::fragments;

const MARIADB_SUPPORTS: DialectSupports = DialectSupports {
    remove_index: &["if_exists"],
    show_constraints: &["column_name", "constraint_name", "constraint_type"],
    remove_column: &["if_exists"],
    ..DialectSupports::NONE
};

/// MariaDB/MySQL query generator.
///
/// The default schema is the database the connection is bound to; MariaDB
/// has no server-wide default, so it must be given.
#[derive(Debug, Clone)]
pub struct MariaDbQueryGenerator {
    database: String,
    max_identifier_length: usize,
}

impl MariaDbQueryGenerator {
    /// Create a generator for the given database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            max_identifier_length: Dialect::MariaDb.max_identifier_length(),
        }
    }

    /// Override the identifier limit used when deriving names.
    pub fn with_max_identifier_length(mut self, max: usize) -> Self {
        self.max_identifier_length = max;
        self
    }

    fn default_value_sql(&self, value: &DefaultValue) -> Option<String> {
        match value {
            DefaultValue::Value(v) => Some(self.escape(v)),
            DefaultValue::Expression(expr) => Some(expr.clone()),
            DefaultValue::Drop => None,
        }
    }

    fn references_sql(&self, reference: &ForeignKeyReference) -> Result<String> {
        let target = self.extract_table_details(&reference.table)?;
        let column = reference.column.as_deref().unwrap_or("id");
        validate_identifier(column)?;
        Ok(join_sql_fragments(fragments![
            "REFERENCES",
            self.quote_table(&target),
            format!("({})", self.quote_identifier(column)),
            reference
                .on_delete
                .map(|action| format!("ON DELETE {}", action.as_sql())),
            reference
                .on_update
                .map(|action| format!("ON UPDATE {}", action.as_sql())),
        ]))
    }

    /// ALTER TABLE clauses for one column.
    fn column_clauses(&self, column: &str, def: &ChangeColumnDefinition) -> Result<Vec<String>> {
        validate_identifier(column)?;
        let quoted = self.quote_identifier(column);
        let mut clauses = Vec::new();

        match &def.data_type {
            Some(data_type) => {
                // MODIFY restates the whole column definition
                clauses.push(join_sql_fragments(fragments![
                    "MODIFY COLUMN",
                    quoted.clone(),
                    self.data_type_sql(data_type)?,
                    def.allow_null
                        .map(|allow| if allow { "NULL" } else { "NOT NULL" }),
                    def.default_value
                        .as_ref()
                        .and_then(|v| self.default_value_sql(v))
                        .map(|v| format!("DEFAULT {}", v)),
                    def.is_auto_increment().then_some("AUTO_INCREMENT"),
                    def.comment
                        .as_deref()
                        .map(|c| format!("COMMENT {}", self.escape_str(c))),
                ]));
            }
            None => {
                if def.allow_null.is_some() || def.auto_increment.is_some() || def.comment.is_some()
                {
                    return Err(QueryGenError::Config(format!(
                        "Changing nullability, auto-increment or comment of column {:?} requires its data type on {}",
                        column,
                        self.name()
                    )));
                }
                match &def.default_value {
                    Some(DefaultValue::Drop) => {
                        clauses.push(format!("ALTER COLUMN {} DROP DEFAULT", quoted));
                    }
                    Some(value) => {
                        if let Some(sql) = self.default_value_sql(value) {
                            clauses.push(format!("ALTER COLUMN {} SET DEFAULT {}", quoted, sql));
                        }
                    }
                    None => {}
                }
            }
        }

        if def.unique == Some(true) {
            clauses.push(format!("ADD UNIQUE ({})", quoted));
        }

        if let Some(reference) = &def.references {
            clauses.push(format!(
                "ADD FOREIGN KEY ({}) {}",
                quoted,
                self.references_sql(reference)?
            ));
        }

        Ok(clauses)
    }
}

impl QueryGenerator for MariaDbQueryGenerator {
    fn name(&self) -> &'static str {
        Dialect::MariaDb.name()
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_mariadb(name)
    }

    fn escape(&self, value: &SqlValue<'_>) -> String {
        escape_mariadb(value)
    }

    fn default_schema(&self) -> &str {
        &self.database
    }

    fn supports(&self) -> &DialectSupports {
        &MARIADB_SUPPORTS
    }

    fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
    }

    fn data_type_sql(&self, data_type: &DataType) -> Result<String> {
        Ok(match data_type {
            DataType::SmallInt => "SMALLINT".into(),
            DataType::Integer => "INTEGER".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "FLOAT".into(),
            DataType::Double => "DOUBLE PRECISION".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
            DataType::String { length } => format!("VARCHAR({})", length.unwrap_or(255)),
            DataType::Text => "TEXT".into(),
            DataType::Boolean => "TINYINT(1)".into(),
            DataType::Date => "DATE".into(),
            DataType::DateTime => "DATETIME(3)".into(),
            DataType::Uuid => "CHAR(36) BINARY".into(),
            DataType::Json | DataType::Jsonb => "JSON".into(),
            DataType::Enum { values } => {
                if values.is_empty() {
                    return Err(QueryGenError::TypeMismatch(
                        "ENUM requires at least one value".into(),
                    ));
                }
                let labels: Vec<String> = values.iter().map(|v| self.escape_str(v)).collect();
                format!("ENUM({})", labels.join(", "))
            }
            DataType::Array(_) => return Err(self.unsupported("ARRAY column type")),
            DataType::Raw(sql) => sql.clone(),
        })
    }

    fn show_constraints_query(
        &self,
        table: &TableName,
        options: &ShowConstraintsOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;

        let sql = join_sql_fragments(fragments![
            "SELECT c.CONSTRAINT_CATALOG AS constraintCatalog,",
            "c.CONSTRAINT_SCHEMA AS constraintSchema,",
            "c.CONSTRAINT_NAME AS constraintName,",
            "c.CONSTRAINT_TYPE AS constraintType,",
            "c.TABLE_SCHEMA AS tableSchema,",
            "c.TABLE_NAME AS tableName,",
            "kcu.COLUMN_NAME AS columnNames,",
            "kcu.REFERENCED_TABLE_SCHEMA AS referencedTableSchema,",
            "kcu.REFERENCED_TABLE_NAME AS referencedTableName,",
            "kcu.REFERENCED_COLUMN_NAME AS referencedColumnNames,",
            "r.DELETE_RULE AS deleteAction,",
            "r.UPDATE_RULE AS updateAction,",
            "ch.CHECK_CLAUSE AS definition",
            "FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS c",
            "LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS r",
            "ON c.CONSTRAINT_CATALOG = r.CONSTRAINT_CATALOG AND c.CONSTRAINT_SCHEMA = r.CONSTRAINT_SCHEMA",
            "AND c.CONSTRAINT_NAME = r.CONSTRAINT_NAME AND c.TABLE_NAME = r.TABLE_NAME",
            "LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu",
            "ON c.CONSTRAINT_CATALOG = kcu.CONSTRAINT_CATALOG AND c.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA",
            "AND c.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME AND c.TABLE_NAME = kcu.TABLE_NAME",
            "LEFT JOIN INFORMATION_SCHEMA.CHECK_CONSTRAINTS ch",
            "ON c.CONSTRAINT_SCHEMA = ch.CONSTRAINT_SCHEMA AND c.CONSTRAINT_NAME = ch.CONSTRAINT_NAME",
            "AND c.TABLE_NAME = ch.TABLE_NAME",
            format!(
                "WHERE c.TABLE_NAME = {} AND c.TABLE_SCHEMA = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            options
                .column_name
                .as_deref()
                .map(|c| format!("AND kcu.COLUMN_NAME = {}", self.escape_str(c))),
            options
                .constraint_name
                .as_deref()
                .map(|n| format!("AND c.CONSTRAINT_NAME = {}", self.escape_str(n))),
            options
                .constraint_type
                .map(|t| format!("AND c.CONSTRAINT_TYPE = {}", self.escape_str(t.as_sql()))),
            "ORDER BY c.CONSTRAINT_NAME, kcu.ORDINAL_POSITION;",
        ]);
        debug!("{} show_constraints_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn show_indexes_query(&self, table: &TableName) -> Result<String> {
        let table = self.extract_table_details(table)?;
        Ok(format!("SHOW INDEX FROM {};", self.quote_table(&table)))
    }

    fn get_foreign_key_query(&self, table: &TableName, column: Option<&str>) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let sql = join_sql_fragments(fragments![
            "SELECT k.CONSTRAINT_NAME AS constraintName,",
            "k.CONSTRAINT_SCHEMA AS constraintSchema,",
            "k.TABLE_NAME AS tableName,",
            "k.TABLE_SCHEMA AS tableSchema,",
            "k.COLUMN_NAME AS columnName,",
            "k.REFERENCED_TABLE_SCHEMA AS referencedTableSchema,",
            "k.REFERENCED_TABLE_NAME AS referencedTableName,",
            "k.REFERENCED_COLUMN_NAME AS referencedColumnName,",
            "r.DELETE_RULE AS deleteAction,",
            "r.UPDATE_RULE AS updateAction",
            "FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE k",
            "LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS r",
            "ON k.CONSTRAINT_SCHEMA = r.CONSTRAINT_SCHEMA AND k.CONSTRAINT_NAME = r.CONSTRAINT_NAME",
            "AND k.TABLE_NAME = r.TABLE_NAME",
            format!(
                "WHERE k.TABLE_NAME = {} AND k.TABLE_SCHEMA = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            column.map(|c| format!("AND k.COLUMN_NAME = {}", self.escape_str(c))),
            "AND k.REFERENCED_TABLE_NAME IS NOT NULL",
            "ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION;",
        ]);
        debug!("{} get_foreign_key_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn version_query(&self) -> Result<String> {
        Ok("SELECT VERSION() as `version`".to_string())
    }

    fn remove_index_query(
        &self,
        table: &TableName,
        index: &IndexRef,
        options: &RemoveIndexOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;
        let name = self.index_name(&table, index)?;

        let sql = join_sql_fragments(fragments![
            "DROP INDEX",
            options.if_exists.then_some("IF EXISTS"),
            self.quote_identifier(&name),
            "ON",
            self.quote_table(&table),
            ";",
        ]);
        debug!("{} remove_index_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn rename_table_query(&self, before: &TableName, after: &TableName) -> Result<String> {
        let before = self.extract_table_details(before)?;
        let after = self.extract_table_details(after)?;
        // RENAME TABLE can also move a table between databases
        Ok(format!(
            "RENAME TABLE {} TO {};",
            self.quote_table(&before),
            self.quote_table(&after)
        ))
    }

    fn change_columns_query(
        &self,
        table: &TableName,
        columns: &ChangeColumnDefinitions,
    ) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let columns = normalize_change_columns(columns)?;

        let mut clauses = Vec::new();
        for (column, def) in &columns {
            let column_clauses = self.column_clauses(column, def)?;
            if column_clauses.is_empty() {
                return Err(QueryGenError::Config(format!(
                    "No changes requested for column {:?}",
                    column
                )));
            }
            clauses.extend(column_clauses);
        }

        let sql = alter_table(self, &table, clauses);
        debug!("{} change_columns_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn get_toggle_foreign_key_checks_query(&self, enable: bool) -> Result<String> {
        Ok(format!(
            "SET FOREIGN_KEY_CHECKS={};",
            if enable { "1" } else { "0" }
        ))
    }

    fn json_path_extraction_query(
        &self,
        sql_expression: &str,
        path: &[JsonPathSegment],
        unquote: bool,
    ) -> Result<String> {
        if path.is_empty() {
            return Err(QueryGenError::Config(
                "JSON path extraction requires at least one path segment".into(),
            ));
        }

        let extract = format!(
            "json_extract({},{})",
            sql_expression,
            self.escape_str(&build_json_path(path))
        );

        // json_compact keeps MariaDB from implicitly unquoting the result
        // when it is compared later
        Ok(if unquote {
            format!("json_unquote({})", extract)
        } else {
            format!("json_compact({})", extract)
        })
    }

    fn format_unquote_json(&self, arg: &SqlExpression<'_>, _options: EscapeOptions) -> Result<String> {
        Ok(format!("json_unquote({})", self.escape_expression(arg)))
    }
}

fn alter_table(gen: &MariaDbQueryGenerator, table: &TableReference, clauses: Vec<String>) -> String {
    join_sql_fragments(vec![
        Fragment::from("ALTER TABLE"),
        Fragment::from(gen.quote_table(table)),
        Fragment::from(clauses.join(", ")),
        Fragment::from(";"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{ConstraintType, RemoveColumnOptions, TruncateTableOptions};
    use crate::core::schema::ReferentialAction;

    fn generator() -> MariaDbQueryGenerator {
        MariaDbQueryGenerator::new("app")
    }

    #[test]
    fn test_quote_identifier() {
        let gen = generator();
        assert_eq!(gen.quote_identifier("users"), "`users`");
        assert_eq!(gen.quote_identifier("table`name"), "`table``name`");
    }

    #[test]
    fn test_describe_table() {
        let sql = generator().describe_table_query(&"users".into()).unwrap();
        assert_eq!(sql, "SHOW FULL COLUMNS FROM `app`.`users`;");
    }

    #[test]
    fn test_show_constraints_filters() {
        let sql = generator()
            .show_constraints_query(
                &"users".into(),
                &ShowConstraintsOptions {
                    constraint_name: Some("users_email_uk".into()),
                    constraint_type: Some(ConstraintType::Unique),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(sql.starts_with("SELECT c.CONSTRAINT_CATALOG AS constraintCatalog,"));
        assert!(sql.contains("WHERE c.TABLE_NAME = 'users' AND c.TABLE_SCHEMA = 'app'"));
        assert!(sql.contains("AND c.CONSTRAINT_NAME = 'users_email_uk'"));
        assert!(sql.contains("AND c.CONSTRAINT_TYPE = 'UNIQUE'"));
        assert!(!sql.contains("kcu.COLUMN_NAME = "));
        assert!(sql.ends_with("ORDER BY c.CONSTRAINT_NAME, kcu.ORDINAL_POSITION;"));
        assert!(!sql.contains('\n'));
    }

    #[test]
    fn test_show_indexes() {
        let sql = generator().show_indexes_query(&"users".into()).unwrap();
        assert_eq!(sql, "SHOW INDEX FROM `app`.`users`;");
    }

    #[test]
    fn test_remove_index() {
        let gen = generator();
        let sql = gen
            .remove_index_query(
                &"users".into(),
                &IndexRef::from("users_email"),
                &RemoveIndexOptions {
                    if_exists: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(sql, "DROP INDEX IF EXISTS `users_email` ON `app`.`users`;");

        let by_fields = gen
            .remove_index_query(
                &"users".into(),
                &IndexRef::from(vec!["email"]),
                &RemoveIndexOptions::default(),
            )
            .unwrap();
        assert_eq!(by_fields, "DROP INDEX `users_email` ON `app`.`users`;");
    }

    #[test]
    fn test_remove_index_rejects_cascade_and_concurrently() {
        let err = generator()
            .remove_index_query(
                &"users".into(),
                &IndexRef::from("users_email"),
                &RemoveIndexOptions {
                    if_exists: true,
                    cascade: true,
                    concurrently: true,
                },
            )
            .unwrap_err();
        assert!(err.is_configuration_error());
        let msg = err.to_string();
        assert!(msg.contains("cascade, concurrently"));
        assert!(!msg.contains("if_exists"));
    }

    #[test]
    fn test_get_foreign_key_query() {
        let sql = generator()
            .get_foreign_key_query(&"orders".into(), Some("user_id"))
            .unwrap();
        assert!(sql.contains("k.REFERENCED_TABLE_NAME AS referencedTableName"));
        assert!(sql.contains("WHERE k.TABLE_NAME = 'orders' AND k.TABLE_SCHEMA = 'app'"));
        assert!(sql.contains("AND k.COLUMN_NAME = 'user_id'"));
        assert!(sql.contains("AND k.REFERENCED_TABLE_NAME IS NOT NULL"));
    }

    #[test]
    fn test_drop_foreign_key() {
        let sql = generator()
            .drop_foreign_key_query(&"orders".into(), "orders_ibfk_1")
            .unwrap();
        assert_eq!(sql, "ALTER TABLE `app`.`orders` DROP FOREIGN KEY `orders_ibfk_1`;");
    }

    #[test]
    fn test_json_path_extraction() {
        let gen = generator();
        let path: Vec<JsonPathSegment> = vec!["address".into(), 0usize.into()];
        let quoted = gen
            .json_path_extraction_query("`profile`", &path, false)
            .unwrap();
        let unquoted = gen
            .json_path_extraction_query("`profile`", &path, true)
            .unwrap();
        assert_eq!(quoted, "json_compact(json_extract(`profile`,'$.address[0]'))");
        assert_eq!(unquoted, "json_unquote(json_extract(`profile`,'$.address[0]'))");

        assert!(gen
            .json_path_extraction_query("`profile`", &[], false)
            .unwrap_err()
            .is_configuration_error());
    }

    #[test]
    fn test_format_unquote_json() {
        let gen = generator();
        let raw = gen
            .format_unquote_json(&SqlExpression::Raw("`data`".into()), EscapeOptions::default())
            .unwrap();
        assert_eq!(raw, "json_unquote(`data`)");
        let value = gen
            .format_unquote_json(
                &SqlExpression::Value(SqlValue::text("\"x\"")),
                EscapeOptions { cast_json: true },
            )
            .unwrap();
        assert_eq!(value, "json_unquote('\\\"x\\\"')");
    }

    #[test]
    fn test_version_and_fk_toggle() {
        let gen = generator();
        assert_eq!(gen.version_query().unwrap(), "SELECT VERSION() as `version`");
        assert_eq!(gen.version_field(), "version");
        assert_eq!(
            gen.get_toggle_foreign_key_checks_query(true).unwrap(),
            "SET FOREIGN_KEY_CHECKS=1;"
        );
        assert_eq!(
            gen.get_toggle_foreign_key_checks_query(false).unwrap(),
            "SET FOREIGN_KEY_CHECKS=0;"
        );
    }

    #[test]
    fn test_no_enum_lifecycle() {
        assert!(generator().as_enum_generator().is_none());
    }

    #[test]
    fn test_change_columns_modify() {
        let mut columns = ChangeColumnDefinitions::new();
        columns.insert(
            "status".into(),
            ChangeColumnDefinition::of_type(DataType::enumeration(["active", "archived"]))
                .allow_null(false)
                .default_value(DefaultValue::Value(SqlValue::from("active")))
                .comment("Lifecycle state"),
        );
        columns.insert(
            "score".into(),
            ChangeColumnDefinition::default().default_value(DefaultValue::Drop),
        );

        let sql = generator()
            .change_columns_query(&"users".into(), &columns)
            .unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE `app`.`users` MODIFY COLUMN `status` ENUM('active', 'archived') NOT NULL DEFAULT 'active' COMMENT 'Lifecycle state', ALTER COLUMN `score` DROP DEFAULT;"
        );
    }

    #[test]
    fn test_change_columns_auto_increment_unique_and_reference() {
        let mut columns = ChangeColumnDefinitions::new();
        columns.insert(
            "id".into(),
            ChangeColumnDefinition::of_type(DataType::BigInt).auto_increment(true),
        );
        columns.insert(
            "owner_id".into(),
            ChangeColumnDefinition::default()
                .unique(true)
                .references(ForeignKeyReference {
                    table: "people".into(),
                    column: None,
                    on_delete: Some(ReferentialAction::Cascade),
                    on_update: None,
                }),
        );

        let sql = generator()
            .change_columns_query(&"accounts".into(), &columns)
            .unwrap();
        assert!(sql.contains("MODIFY COLUMN `id` BIGINT NOT NULL AUTO_INCREMENT"));
        assert!(sql.contains(
            "ADD UNIQUE (`owner_id`), ADD FOREIGN KEY (`owner_id`) REFERENCES `app`.`people` (`id`) ON DELETE CASCADE;"
        ));
    }

    #[test]
    fn test_change_columns_without_type_rejects_nullability() {
        let mut columns = ChangeColumnDefinitions::new();
        columns.insert("name".into(), ChangeColumnDefinition::default().allow_null(true));
        let err = generator()
            .change_columns_query(&"users".into(), &columns)
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_change_columns_rejects_arrays() {
        let mut columns = ChangeColumnDefinitions::new();
        columns.insert(
            "tags".into(),
            ChangeColumnDefinition::of_type(DataType::Array(Box::new(DataType::Text))),
        );
        let err = generator()
            .change_columns_query(&"users".into(), &columns)
            .unwrap_err();
        assert!(matches!(err, QueryGenError::Unsupported { .. }));
    }

    #[test]
    fn test_unsupported_options_on_shared_operations() {
        let gen = generator();
        let err = gen
            .truncate_table_query(
                &"users".into(),
                &TruncateTableOptions {
                    cascade: true,
                    restart_identity: true,
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("cascade, restart_identity"));

        let sql = gen
            .remove_column_query(
                &"users".into(),
                "nickname",
                &RemoveColumnOptions {
                    if_exists: true,
                    cascade: false,
                },
            )
            .unwrap();
        assert_eq!(sql, "ALTER TABLE `app`.`users` DROP COLUMN IF EXISTS `nickname`;");
    }

    #[test]
    fn test_rename_table_across_databases() {
        let sql = generator()
            .rename_table_query(&"users".into(), &"archive.users".into())
            .unwrap();
        assert_eq!(sql, "RENAME TABLE `app`.`users` TO `archive`.`users`;");
    }
}
