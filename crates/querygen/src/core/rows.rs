//! Typed shapes of introspection result rows.
//!
//! Field names equal the column aliases the generators emit, so a row decoded
//! from either dialect lands in the same struct. Renaming an alias in a
//! generator is a breaking change for these types.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Booleans arrive as `true`/`false`, `1`/`0` or `YES`/`NO` depending on the
/// catalog the column came from.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => None,
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Int(i)) => Some(i != 0),
        Some(Flag::Text(s)) => Some(matches!(
            s.to_ascii_uppercase().as_str(),
            "YES" | "TRUE" | "T" | "1"
        )),
    })
}

/// One column of a table, as returned by `describe_table_query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptionRow {
    #[serde(rename = "Field")]
    pub field: String,

    #[serde(rename = "Type")]
    pub data_type: String,

    /// `YES` / `NO`.
    #[serde(rename = "Null")]
    pub null: String,

    #[serde(rename = "Default", default)]
    pub default: Option<String>,

    /// MariaDB `Key` (`PRI`, `UNI`, `MUL`).
    #[serde(rename = "Key", default)]
    pub key: Option<String>,

    /// PostgreSQL primary key marker (`PRIMARY KEY`).
    #[serde(rename = "Constraint", default)]
    pub constraint: Option<String>,

    /// Enum labels for enum-typed columns.
    #[serde(default)]
    pub special: Option<Vec<String>>,

    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

impl ColumnDescriptionRow {
    pub fn allows_null(&self) -> bool {
        self.null.eq_ignore_ascii_case("YES")
    }

    pub fn is_primary_key(&self) -> bool {
        self.key.as_deref() == Some("PRI") || self.constraint.as_deref() == Some("PRIMARY KEY")
    }
}

/// One row of `show_constraints_query`. Composite constraints produce one row
/// per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRow {
    #[serde(default)]
    pub constraint_catalog: Option<String>,
    pub constraint_schema: String,
    pub constraint_name: String,
    pub constraint_type: String,
    #[serde(default)]
    pub table_schema: Option<String>,
    pub table_name: String,
    #[serde(default)]
    pub column_names: Option<String>,
    #[serde(default)]
    pub referenced_table_schema: Option<String>,
    #[serde(default)]
    pub referenced_table_name: Option<String>,
    #[serde(default)]
    pub referenced_column_names: Option<String>,
    #[serde(default)]
    pub delete_action: Option<String>,
    #[serde(default)]
    pub update_action: Option<String>,
    /// CHECK expression or full constraint definition.
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_deferrable: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub initially_deferred: Option<bool>,
}

/// One referencing/referenced column pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRow {
    pub constraint_name: String,
    #[serde(default)]
    pub constraint_schema: Option<String>,
    #[serde(default)]
    pub table_schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    #[serde(default)]
    pub referenced_table_schema: Option<String>,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    #[serde(default)]
    pub delete_action: Option<String>,
    #[serde(default)]
    pub update_action: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_deferrable: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub initially_deferred: Option<bool>,
}

/// PostgreSQL index row: one per index, columns aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub name: String,
    #[serde(deserialize_with = "deserialize_required_flag")]
    pub primary: bool,
    #[serde(deserialize_with = "deserialize_required_flag")]
    pub unique: bool,
    pub index_fields: Vec<String>,
    #[serde(default)]
    pub include_fields: Vec<String>,
    #[serde(default)]
    pub definition: Option<String>,
}

fn deserialize_required_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_flag(deserializer)?.unwrap_or(false))
}

/// MariaDB `SHOW INDEX` row: one per indexed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowIndexRow {
    #[serde(rename = "Table")]
    pub table: String,

    #[serde(rename = "Non_unique", deserialize_with = "deserialize_required_flag")]
    pub non_unique: bool,

    #[serde(rename = "Key_name")]
    pub key_name: String,

    #[serde(rename = "Seq_in_index")]
    pub seq_in_index: u32,

    #[serde(rename = "Column_name")]
    pub column_name: Option<String>,

    #[serde(rename = "Index_type", default)]
    pub index_type: Option<String>,
}

impl ShowIndexRow {
    pub fn is_primary(&self) -> bool {
        self.key_name == "PRIMARY"
    }
}

impl IndexRow {
    /// Fold per-column `SHOW INDEX` rows into one row per index.
    ///
    /// Indexes keep the order they first appear in; columns follow
    /// `Seq_in_index`. Expression parts (no column name) are skipped.
    pub fn from_show_index_rows(rows: Vec<ShowIndexRow>) -> Vec<IndexRow> {
        let mut grouped: IndexMap<String, (IndexRow, Vec<(u32, String)>)> = IndexMap::new();
        for row in rows {
            let (_, columns) = grouped.entry(row.key_name.clone()).or_insert_with(|| {
                (
                    IndexRow {
                        name: row.key_name.clone(),
                        primary: row.is_primary(),
                        unique: !row.non_unique,
                        index_fields: Vec::new(),
                        include_fields: Vec::new(),
                        definition: None,
                    },
                    Vec::new(),
                )
            });
            if let Some(column) = row.column_name {
                columns.push((row.seq_in_index, column));
            }
        }

        grouped
            .into_values()
            .map(|(mut index, mut columns)| {
                columns.sort_by_key(|(seq, _)| *seq);
                index.index_fields = columns.into_iter().map(|(_, column)| column).collect();
                index
            })
            .collect()
    }
}

/// One enum type with its labels in sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumRow {
    pub enum_name: String,
    pub enum_value: Vec<String>,
}

/// Result of the version query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    #[serde(alias = "server_version")]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraint_row_from_postgres_shape() {
        let row: ConstraintRow = serde_json::from_value(json!({
            "constraintCatalog": "app",
            "constraintSchema": "public",
            "constraintName": "orders_user_id_fkey",
            "constraintType": "FOREIGN KEY",
            "tableSchema": "public",
            "tableName": "orders",
            "columnNames": "user_id",
            "referencedTableSchema": "public",
            "referencedTableName": "users",
            "referencedColumnNames": "id",
            "deleteAction": "CASCADE",
            "updateAction": "NO ACTION",
            "definition": "FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE",
            "isDeferrable": false,
            "initiallyDeferred": false
        }))
        .unwrap();
        assert_eq!(row.referenced_table_name.as_deref(), Some("users"));
        assert_eq!(row.is_deferrable, Some(false));
    }

    #[test]
    fn test_constraint_row_from_mariadb_shape() {
        // MariaDB has no deferrability columns
        let row: ConstraintRow = serde_json::from_value(json!({
            "constraintCatalog": "def",
            "constraintSchema": "app",
            "constraintName": "PRIMARY",
            "constraintType": "PRIMARY KEY",
            "tableSchema": "app",
            "tableName": "users",
            "columnNames": "id",
            "referencedTableSchema": null,
            "referencedTableName": null,
            "referencedColumnNames": null,
            "deleteAction": null,
            "updateAction": null,
            "definition": null
        }))
        .unwrap();
        assert_eq!(row.constraint_type, "PRIMARY KEY");
        assert!(row.is_deferrable.is_none());
    }

    #[test]
    fn test_flag_accepts_yes_no_and_ints() {
        let row: ForeignKeyRow = serde_json::from_value(json!({
            "constraintName": "fk",
            "tableName": "orders",
            "columnName": "user_id",
            "referencedTableName": "users",
            "referencedColumnName": "id",
            "isDeferrable": "YES",
            "initiallyDeferred": 0
        }))
        .unwrap();
        assert_eq!(row.is_deferrable, Some(true));
        assert_eq!(row.initially_deferred, Some(false));
    }

    #[test]
    fn test_describe_row_from_both_dialects() {
        let maria: ColumnDescriptionRow = serde_json::from_value(json!({
            "Field": "id", "Type": "int(11)", "Collation": null, "Null": "NO",
            "Key": "PRI", "Default": null, "Extra": "auto_increment",
            "Privileges": "select", "Comment": ""
        }))
        .unwrap();
        assert!(maria.is_primary_key());
        assert!(!maria.allows_null());

        let pg: ColumnDescriptionRow = serde_json::from_value(json!({
            "Constraint": null, "Field": "status", "Default": null, "Null": "YES",
            "Type": "USER-DEFINED", "special": ["active", "archived"], "Comment": null
        }))
        .unwrap();
        assert!(pg.allows_null());
        assert_eq!(pg.special.unwrap(), ["active", "archived"]);
    }

    #[test]
    fn test_index_rows() {
        let pg: IndexRow = serde_json::from_value(json!({
            "name": "users_email", "primary": false, "unique": true,
            "index_fields": ["email"], "include_fields": ["name"],
            "definition": "CREATE UNIQUE INDEX users_email ON public.users USING btree (email) INCLUDE (name)"
        }))
        .unwrap();
        assert!(pg.unique);
        assert_eq!(pg.include_fields, ["name"]);

        let maria: ShowIndexRow = serde_json::from_value(json!({
            "Table": "users", "Non_unique": 0, "Key_name": "PRIMARY",
            "Seq_in_index": 1, "Column_name": "id", "Index_type": "BTREE"
        }))
        .unwrap();
        assert!(maria.is_primary());
        assert!(!maria.non_unique);
    }

    #[test]
    fn test_show_index_rows_fold_per_index() {
        let row = |key: &str, non_unique: i64, seq: u32, column: &str| -> ShowIndexRow {
            serde_json::from_value(json!({
                "Table": "orders", "Non_unique": non_unique, "Key_name": key,
                "Seq_in_index": seq, "Column_name": column, "Index_type": "BTREE"
            }))
            .unwrap()
        };
        let indexes = IndexRow::from_show_index_rows(vec![
            row("PRIMARY", 0, 1, "id"),
            row("orders_customer_created", 1, 2, "created_at"),
            row("orders_customer_created", 1, 1, "customer_id"),
        ]);

        assert_eq!(indexes.len(), 2);
        assert!(indexes[0].primary && indexes[0].unique);
        assert_eq!(indexes[1].name, "orders_customer_created");
        assert!(!indexes[1].unique);
        assert_eq!(indexes[1].index_fields, ["customer_id", "created_at"]);
        assert!(indexes[1].include_fields.is_empty());
    }

    #[test]
    fn test_version_row_accepts_both_aliases() {
        let v: VersionRow = serde_json::from_value(json!({ "version": "10.11.2-MariaDB" })).unwrap();
        assert_eq!(v.version, "10.11.2-MariaDB");
        let v: VersionRow = serde_json::from_value(json!({ "server_version": "16.1" })).unwrap();
        assert_eq!(v.version, "16.1");
    }
}
