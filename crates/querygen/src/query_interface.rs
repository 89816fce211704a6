//! Execution-side helpers layered on a query generator.
//!
//! [`QueryInterfaceInternal`] pairs a generator with a [`RawQueryExecutor`]
//! (the connection layer, supplied by the caller), runs the generated
//! introspection statements and decodes the rows into the typed shapes of
//! [`crate::core::rows`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::options::{ListEnumsOptions, ShowConstraintsOptions};
use crate::core::rows::{
    ColumnDescriptionRow, ConstraintRow, EnumRow, ForeignKeyRow, IndexRow, ShowIndexRow,
    VersionRow,
};
use crate::core::schema::TableName;
use crate::core::traits::QueryGenerator;
use crate::error::{BoxError, QueryGenError, Result};

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Runs a SQL string and returns its rows without any processing.
#[async_trait]
pub trait RawQueryExecutor: Send + Sync {
    async fn query_raw(&self, sql: &str) -> std::result::Result<Vec<Row>, BoxError>;
}

/// Query helpers shared by the model layer.
#[derive(Clone)]
pub struct QueryInterfaceInternal {
    generator: Arc<dyn QueryGenerator>,
    executor: Arc<dyn RawQueryExecutor>,
}

impl QueryInterfaceInternal {
    pub fn new(generator: Arc<dyn QueryGenerator>, executor: Arc<dyn RawQueryExecutor>) -> Self {
        Self {
            generator,
            executor,
        }
    }

    /// The generator statements are built with.
    pub fn generator(&self) -> &Arc<dyn QueryGenerator> {
        &self.generator
    }

    async fn run(&self, sql: &str) -> Result<Vec<Row>> {
        debug!("{} executing: {}", self.generator.name(), sql);
        self.executor
            .query_raw(sql)
            .await
            .map_err(QueryGenError::Execution)
    }

    async fn run_typed<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>> {
        decode_rows(self.run(sql).await?)
    }

    /// Run the dialect's version query and return its single row untouched.
    ///
    /// # Errors
    ///
    /// `Assertion` unless exactly one row comes back; `Execution` if the
    /// executor fails; `Unsupported` if the dialect has no version query.
    pub async fn fetch_database_version_raw(&self) -> Result<Row> {
        let sql = self.generator.version_query()?;
        let mut rows = self.run(&sql).await?;
        if rows.len() != 1 {
            return Err(QueryGenError::Assertion(format!(
                "Expected exactly one row from the version query, got {}",
                rows.len()
            )));
        }
        Ok(rows.remove(0))
    }

    /// Server version string.
    pub async fn fetch_database_version(&self) -> Result<String> {
        let row = self.fetch_database_version_raw().await?;
        let field = self.generator.version_field();
        if row.get(field).map_or(true, Value::is_null) {
            return Err(QueryGenError::Assertion(format!(
                "Version row has no {} column",
                field
            )));
        }
        let row: VersionRow = serde_json::from_value(Value::Object(row))?;
        Ok(row.version)
    }

    /// Column metadata for a table.
    pub async fn describe_table(&self, table: &TableName) -> Result<Vec<ColumnDescriptionRow>> {
        let sql = self.generator.describe_table_query(table)?;
        self.run_typed(&sql).await
    }

    /// Constraint rows for a table.
    pub async fn show_constraints(
        &self,
        table: &TableName,
        options: &ShowConstraintsOptions,
    ) -> Result<Vec<ConstraintRow>> {
        let sql = self.generator.show_constraints_query(table, options)?;
        self.run_typed(&sql).await
    }

    /// Indexes of a table, one row per index.
    ///
    /// Per-column `SHOW INDEX` output is folded so both dialects return the
    /// same shape.
    pub async fn show_indexes(&self, table: &TableName) -> Result<Vec<IndexRow>> {
        let sql = self.generator.show_indexes_query(table)?;
        let rows = self.run(&sql).await?;
        if rows.first().map_or(false, |row| row.contains_key("Key_name")) {
            let rows = decode_rows::<ShowIndexRow>(rows)?;
            return Ok(IndexRow::from_show_index_rows(rows));
        }
        decode_rows(rows)
    }

    /// Foreign key column pairs for a table.
    pub async fn get_foreign_keys(
        &self,
        table: &TableName,
        column: Option<&str>,
    ) -> Result<Vec<ForeignKeyRow>> {
        let sql = self.generator.get_foreign_key_query(table, column)?;
        self.run_typed(&sql).await
    }

    /// Enum types with their labels.
    pub async fn list_enums(&self, options: &ListEnumsOptions) -> Result<Vec<EnumRow>> {
        let enums = self
            .generator
            .as_enum_generator()
            .ok_or_else(|| self.generator.unsupported("list_enums_query"))?;
        let sql = enums.list_enums_query(options)?;
        self.run_typed(&sql).await
    }

    /// Whether a base table exists.
    pub async fn table_exists(&self, table: &TableName) -> Result<bool> {
        let sql = self.generator.table_exists_query(table)?;
        Ok(!self.run(&sql).await?.is_empty())
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(QueryGenError::from))
        .collect()
}

impl std::fmt::Debug for QueryInterfaceInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryInterfaceInternal")
            .field("dialect", &self.generator.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{MariaDbQueryGenerator, PostgresQueryGenerator};
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns canned rows and records every statement it was given.
    struct MockExecutor {
        rows: Vec<Row>,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn returning(rows: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                rows: rows
                    .into_iter()
                    .filter_map(|v| v.as_object().cloned())
                    .collect(),
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rows: Vec::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RawQueryExecutor for MockExecutor {
        async fn query_raw(&self, sql: &str) -> std::result::Result<Vec<Row>, BoxError> {
            self.seen.lock().unwrap().push(sql.to_string());
            if self.fail {
                return Err("connection reset".into());
            }
            Ok(self.rows.clone())
        }
    }

    fn postgres(executor: Arc<MockExecutor>) -> QueryInterfaceInternal {
        QueryInterfaceInternal::new(Arc::new(PostgresQueryGenerator::new()), executor)
    }

    #[tokio::test]
    async fn test_fetch_version_postgres() {
        let executor = MockExecutor::returning(vec![json!({"server_version": "16.2"})]);
        let qi = postgres(executor.clone());

        assert_eq!(qi.fetch_database_version().await.unwrap(), "16.2");
        assert_eq!(
            executor.seen.lock().unwrap().as_slice(),
            ["SHOW SERVER_VERSION"]
        );
    }

    #[tokio::test]
    async fn test_fetch_version_mariadb() {
        let executor = MockExecutor::returning(vec![json!({"version": "11.4.2-MariaDB"})]);
        let qi = QueryInterfaceInternal::new(
            Arc::new(MariaDbQueryGenerator::new("shop")),
            executor.clone(),
        );

        assert_eq!(qi.fetch_database_version().await.unwrap(), "11.4.2-MariaDB");
        assert_eq!(
            executor.seen.lock().unwrap()[0],
            "SELECT VERSION() as `version`"
        );
    }

    #[tokio::test]
    async fn test_fetch_version_raw_returns_row() {
        let executor = MockExecutor::returning(vec![json!({"server_version": "15.1", "extra": 1})]);
        let row = postgres(executor).fetch_database_version_raw().await.unwrap();
        assert_eq!(row.get("extra"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_fetch_version_requires_exactly_one_row() {
        let none = postgres(MockExecutor::returning(vec![]));
        let err = none.fetch_database_version_raw().await.unwrap_err();
        assert!(matches!(err, QueryGenError::Assertion(_)));

        let two = postgres(MockExecutor::returning(vec![
            json!({"server_version": "16"}),
            json!({"server_version": "16"}),
        ]));
        let err = two.fetch_database_version().await.unwrap_err();
        assert!(matches!(err, QueryGenError::Assertion(_)));
    }

    #[tokio::test]
    async fn test_fetch_version_missing_column() {
        let qi = postgres(MockExecutor::returning(vec![json!({"version": "16"})]));
        let err = qi.fetch_database_version().await.unwrap_err();
        assert!(err.to_string().contains("server_version"));
    }

    #[tokio::test]
    async fn test_executor_errors_pass_through() {
        let err = postgres(MockExecutor::failing())
            .fetch_database_version()
            .await
            .unwrap_err();
        assert!(matches!(err, QueryGenError::Execution(_)));
        assert!(err.format_detailed().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_describe_table_decodes_rows() {
        let qi = postgres(MockExecutor::returning(vec![
            json!({
                "Constraint": "PRIMARY KEY",
                "Field": "id",
                "Default": "nextval('users_id_seq'::regclass)",
                "Null": "NO",
                "Type": "integer",
                "special": null,
                "Comment": null
            }),
            json!({
                "Constraint": null,
                "Field": "status",
                "Default": null,
                "Null": "YES",
                "Type": "USER-DEFINED",
                "special": ["active", "archived"],
                "Comment": "Lifecycle"
            }),
        ]));
        let columns = qi.describe_table(&"users".into()).await.unwrap();
        assert_eq!(columns.len(), 2);
        assert!(columns[0].is_primary_key());
        assert!(!columns[0].allows_null());
        assert_eq!(columns[1].special.as_deref().unwrap(), ["active", "archived"]);
    }

    #[tokio::test]
    async fn test_show_indexes_postgres_rows() {
        let executor = MockExecutor::returning(vec![json!({
            "name": "users_pkey", "primary": true, "unique": true,
            "index_fields": ["id"], "include_fields": [],
            "definition": "CREATE UNIQUE INDEX users_pkey ON public.users USING btree (id)"
        })]);
        let indexes = postgres(executor.clone())
            .show_indexes(&"users".into())
            .await
            .unwrap();
        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].primary);
        assert!(executor.seen.lock().unwrap()[0].contains("pg_catalog.pg_index"));
    }

    #[tokio::test]
    async fn test_show_indexes_mariadb_rows_are_folded() {
        let row = |key: &str, seq: u32, column: &str| {
            json!({
                "Table": "users", "Non_unique": 1, "Key_name": key,
                "Seq_in_index": seq, "Column_name": column, "Index_type": "BTREE"
            })
        };
        let executor = MockExecutor::returning(vec![
            row("users_tenant_email", 1, "tenant_id"),
            row("users_tenant_email", 2, "email"),
        ]);
        let qi = QueryInterfaceInternal::new(
            Arc::new(MariaDbQueryGenerator::new("shop")),
            executor.clone(),
        );
        let indexes = qi.show_indexes(&"users".into()).await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].index_fields, ["tenant_id", "email"]);
        assert!(!indexes[0].unique);
        assert!(executor.seen.lock().unwrap()[0].starts_with("SHOW INDEX FROM `shop`.`users`"));
    }

    #[tokio::test]
    async fn test_get_foreign_keys_decodes_composite_key() {
        let row = |column: &str, referenced: &str| {
            json!({
                "constraintName": "orders_item_fk",
                "tableName": "orders",
                "columnName": column,
                "referencedTableName": "items",
                "referencedColumnName": referenced,
                "deleteAction": "CASCADE",
                "isDeferrable": false
            })
        };
        let qi = postgres(MockExecutor::returning(vec![
            row("item_id", "id"),
            row("item_rev", "rev"),
        ]));
        let keys = qi.get_foreign_keys(&"orders".into(), None).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].referenced_column_name, "rev");
        assert_eq!(keys[0].is_deferrable, Some(false));
    }

    #[tokio::test]
    async fn test_list_enums_requires_enum_lifecycle() {
        let qi = postgres(MockExecutor::returning(vec![
            json!({"enum_name": "mood", "enum_value": ["sad", "happy"]}),
        ]));
        let enums = qi.list_enums(&ListEnumsOptions::default()).await.unwrap();
        assert_eq!(enums[0].enum_value, ["sad", "happy"]);

        let mariadb = QueryInterfaceInternal::new(
            Arc::new(MariaDbQueryGenerator::new("shop")),
            MockExecutor::returning(vec![]),
        );
        let err = mariadb
            .list_enums(&ListEnumsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryGenError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_table_exists() {
        let present = postgres(MockExecutor::returning(vec![json!({"TABLE_NAME": "users"})]));
        assert!(present.table_exists(&"users".into()).await.unwrap());

        let absent = postgres(MockExecutor::returning(vec![]));
        assert!(!absent.table_exists(&"users".into()).await.unwrap());
    }
}
