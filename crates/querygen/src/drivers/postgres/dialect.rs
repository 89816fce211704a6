//! PostgreSQL SQL generation (Strategy pattern).
//!
//! Introspection reads `pg_catalog` where information_schema lacks the data:
//! deferrability, index INCLUDE columns, and composite foreign keys, which are
//! stored as parallel `conkey`/`confkey` arrays and unnested pairwise.

use tracing::debug;

use crate::core::fragments::{join_sql_fragments, join_statements};
use crate::core::identifier::{quote_pg, validate_identifier};
use crate::core::naming::{generate_enum_name, generate_sequence_name};
use crate::core::options::{
    check_options, CreateEnumOptions, DialectSupports, RemoveIndexOptions,
    ShowConstraintsOptions,
};
use crate::core::schema::{
    normalize_change_columns, ChangeColumnDefinition, ChangeColumnDefinitions,
    ConstraintChecking, DataType, DefaultValue, EnumDescriptor, EscapeOptions,
    ForeignKeyReference, IndexRef, JsonPathSegment, SqlExpression, TableName, TableReference,
};
use crate::core::traits::{EnumQueryGenerator, QueryGenerator};
use crate::core::value::{escape_pg, SqlValue};
use crate::drivers::Dialect;
use crate::error::{QueryGenError, Result};
use crate::fragments;

const POSTGRES_SUPPORTS: DialectSupports = DialectSupports {
    remove_index: &["if_exists", "cascade", "concurrently"],
    show_constraints: &["column_name", "constraint_name", "constraint_type"],
    drop_table: &["cascade"],
    truncate_table: &["cascade", "restart_identity"],
    remove_column: &["if_exists", "cascade"],
    create_enum: &["force"],
    list_enums: &["schema", "data_type"],
    add_value_to_enum: &["before", "after"],
};

/// `pg_constraint.confdeltype` / `confupdtype` codes as SQL keywords.
fn referential_action_case(column: &str) -> String {
    format!(
        "CASE {} WHEN 'a' THEN 'NO ACTION' WHEN 'r' THEN 'RESTRICT' WHEN 'c' THEN 'CASCADE' WHEN 'n' THEN 'SET NULL' WHEN 'd' THEN 'SET DEFAULT' END",
        column
    )
}

/// PostgreSQL query generator.
#[derive(Debug, Clone)]
pub struct PostgresQueryGenerator {
    default_schema: String,
    max_identifier_length: usize,
}

impl Default for PostgresQueryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresQueryGenerator {
    /// Create a generator using the `public` schema.
    pub fn new() -> Self {
        Self {
            default_schema: "public".to_string(),
            max_identifier_length: Dialect::Postgres.max_identifier_length(),
        }
    }

    /// Use a different default schema.
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Override the identifier limit used when deriving names.
    pub fn with_max_identifier_length(mut self, max: usize) -> Self {
        self.max_identifier_length = max;
        self
    }

    fn quote_column(&self, table: &TableReference, column: &str) -> String {
        format!("{}.{}", self.quote_table(table), self.quote_identifier(column))
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
}

/// Statements produced for a single column, by phase.
#[derive(Default)]
struct ColumnChange {
    sequences: Vec<String>,
    enum_creates: Vec<String>,
    alter_clauses: Vec<String>,
    enum_swaps: Vec<String>,
    comments: Vec<String>,
}

impl PostgresQueryGenerator {
    fn column_change(
        &self,
        table: &TableReference,
        column: &str,
        def: &ChangeColumnDefinition,
    ) -> Result<ColumnChange> {
        validate_identifier(column)?;
        let quoted = self.quote_identifier(column);
        let mut change = ColumnChange::default();

        if let Some(data_type) = &def.data_type {
            if data_type.enum_values().is_some() {
                self.enum_type_change(table, column, data_type, &mut change)?;
            } else {
                change.alter_clauses.push(format!(
                    "ALTER COLUMN {} TYPE {}",
                    quoted,
                    self.data_type_sql(data_type)?
                ));
            }
        }

        match def.allow_null {
            Some(false) => change
                .alter_clauses
                .push(format!("ALTER COLUMN {} SET NOT NULL", quoted)),
            Some(true) => change
                .alter_clauses
                .push(format!("ALTER COLUMN {} DROP NOT NULL", quoted)),
            None => {}
        }

        if def.is_auto_increment() {
            let sequence = TableReference {
                table_name: generate_sequence_name(
                    &table.table_name,
                    column,
                    self.max_identifier_length(),
                ),
                schema: table.schema.clone(),
            };
            let quoted_sequence = self.quote_table(&sequence);
            change.sequences.push(format!(
                "CREATE SEQUENCE IF NOT EXISTS {} OWNED BY {}",
                quoted_sequence,
                self.quote_column(table, column)
            ));
            change.alter_clauses.push(format!(
                "ALTER COLUMN {} SET DEFAULT nextval({}::regclass)",
                quoted,
                self.escape_str(&quoted_sequence)
            ));
        } else {
            match &def.default_value {
                Some(DefaultValue::Value(value)) => change.alter_clauses.push(format!(
                    "ALTER COLUMN {} SET DEFAULT {}",
                    quoted,
                    self.escape(value)
                )),
                Some(DefaultValue::Expression(expr)) => change
                    .alter_clauses
                    .push(format!("ALTER COLUMN {} SET DEFAULT {}", quoted, expr)),
                Some(DefaultValue::Drop) => change
                    .alter_clauses
                    .push(format!("ALTER COLUMN {} DROP DEFAULT", quoted)),
                None => {}
            }
        }

        if def.unique == Some(true) {
            change.alter_clauses.push(format!("ADD UNIQUE ({})", quoted));
        }

        if let Some(reference) = &def.references {
            change.alter_clauses.push(format!(
                "ADD FOREIGN KEY ({}) {}",
                quoted,
                self.references_sql(reference)?
            ));
        }

        if let Some(comment) = &def.comment {
            let value = if comment.is_empty() {
                "NULL".to_string()
            } else {
                self.escape_str(comment)
            };
            change.comments.push(format!(
                "COMMENT ON COLUMN {} IS {}",
                self.quote_column(table, column),
                value
            ));
        }

        Ok(change)
    }

    /// Swap a column onto a freshly created enum type.
    ///
    /// The new labels go into a temporary type first; the canonical type is
    /// dropped and the temporary one renamed only after the column moved.
    fn enum_type_change(
        &self,
        table: &TableReference,
        column: &str,
        data_type: &DataType,
        change: &mut ColumnChange,
    ) -> Result<()> {
        let temp_name = TableName::with_schema(
            table.schema.as_str(),
            generate_enum_name(&table.table_name, column, true, self.max_identifier_length()),
        );
        let temp = EnumDescriptor::from_data_type(temp_name, data_type).ok_or_else(|| {
            QueryGenError::TypeMismatch(format!("{:?} is not an ENUM type", data_type))
        })?;
        let canonical_name =
            generate_enum_name(&table.table_name, column, false, self.max_identifier_length());
        let canonical = TableName::with_schema(table.schema.as_str(), canonical_name.as_str());

        change.enum_creates.push(
            self.create_enum_from_descriptor(&temp, &CreateEnumOptions { force: true })?,
        );

        let temp_ref = self.extract_table_details(&temp.name)?;
        let quoted_temp = self.quote_table(&temp_ref);
        let quoted = self.quote_identifier(column);
        let clause = if data_type.is_enum_array() {
            format!(
                "ALTER COLUMN {col} TYPE {ty}[] USING ({col}::text[]::{ty}[])",
                col = quoted,
                ty = quoted_temp
            )
        } else {
            format!(
                "ALTER COLUMN {col} TYPE {ty} USING ({col}::text::{ty})",
                col = quoted,
                ty = quoted_temp
            )
        };
        change.alter_clauses.push(clause);

        change.enum_swaps.push(self.drop_enum_query(&canonical)?);
        change.enum_swaps.push(format!(
            "ALTER TYPE {} RENAME TO {}",
            quoted_temp,
            self.quote_identifier(&canonical_name)
        ));
        Ok(())
    }
}

impl QueryGenerator for PostgresQueryGenerator {
    fn name(&self) -> &'static str {
        Dialect::Postgres.name()
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_pg(name)
    }

    fn escape(&self, value: &SqlValue<'_>) -> String {
        escape_pg(value)
    }

    fn default_schema(&self) -> &str {
        &self.default_schema
    }

    fn supports(&self) -> &DialectSupports {
        &POSTGRES_SUPPORTS
    }

    fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
    }

    fn data_type_sql(&self, data_type: &DataType) -> Result<String> {
        Ok(match data_type {
            DataType::SmallInt => "SMALLINT".into(),
            DataType::Integer => "INTEGER".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "REAL".into(),
            DataType::Double => "DOUBLE PRECISION".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
            DataType::String { length } => format!("VARCHAR({})", length.unwrap_or(255)),
            DataType::Text => "TEXT".into(),
            DataType::Boolean => "BOOLEAN".into(),
            DataType::Date => "DATE".into(),
            DataType::DateTime => "TIMESTAMP WITH TIME ZONE".into(),
            DataType::Uuid => "UUID".into(),
            DataType::Json => "JSON".into(),
            DataType::Jsonb => "JSONB".into(),
            DataType::Enum { .. } => {
                return Err(QueryGenError::TypeMismatch(
                    "ENUM columns are backed by a named type; create it with create_enum_query"
                        .into(),
                ))
            }
            DataType::Array(inner) => format!("{}[]", self.data_type_sql(inner)?),
            DataType::Raw(sql) => sql.clone(),
        })
    }

    fn describe_table_query(&self, table: &TableName) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let sql = join_sql_fragments(fragments![
            "SELECT pk.constraint_type as \"Constraint\",",
            "c.column_name as \"Field\",",
            "c.column_default as \"Default\",",
            "c.is_nullable as \"Null\",",
            "(CASE WHEN c.udt_name = 'hstore' THEN c.udt_name ELSE c.data_type END)",
            "|| (CASE WHEN c.character_maximum_length IS NOT NULL THEN '(' || c.character_maximum_length || ')' ELSE '' END) as \"Type\",",
            "(SELECT array_agg(e.enumlabel ORDER BY e.enumsortorder) FROM pg_catalog.pg_type t",
            "JOIN pg_catalog.pg_enum e ON t.oid = e.enumtypid WHERE t.typname = c.udt_name) AS \"special\",",
            "(SELECT pgd.description FROM pg_catalog.pg_statio_all_tables AS st",
            "INNER JOIN pg_catalog.pg_description pgd ON pgd.objoid = st.relid",
            "WHERE c.ordinal_position = pgd.objsubid AND c.table_name = st.relname AND c.table_schema = st.schemaname) AS \"Comment\"",
            "FROM information_schema.columns c",
            "LEFT JOIN (SELECT tc.table_schema, tc.table_name, cu.column_name, tc.constraint_type",
            "FROM information_schema.TABLE_CONSTRAINTS tc",
            "JOIN information_schema.KEY_COLUMN_USAGE cu",
            "ON tc.table_schema = cu.table_schema AND tc.table_name = cu.table_name AND tc.constraint_name = cu.constraint_name",
            "AND tc.constraint_type = 'PRIMARY KEY') pk",
            "ON pk.table_schema = c.table_schema AND pk.table_name = c.table_name AND pk.column_name = c.column_name",
            format!(
                "WHERE c.table_name = {} AND c.table_schema = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            "ORDER BY c.ordinal_position;",
        ]);
        debug!("{} describe_table_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn show_constraints_query(
        &self,
        table: &TableName,
        options: &ShowConstraintsOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let table = self.extract_table_details(table)?;

        let sql = join_sql_fragments(fragments![
            "SELECT c.constraint_catalog AS \"constraintCatalog\",",
            "c.constraint_schema AS \"constraintSchema\",",
            "c.constraint_name AS \"constraintName\",",
            "c.constraint_type AS \"constraintType\",",
            "c.table_schema AS \"tableSchema\",",
            "c.table_name AS \"tableName\",",
            "kcu.column_name AS \"columnNames\",",
            "ccu.table_schema AS \"referencedTableSchema\",",
            "ccu.table_name AS \"referencedTableName\",",
            "ccu.column_name AS \"referencedColumnNames\",",
            "r.delete_rule AS \"deleteAction\",",
            "r.update_rule AS \"updateAction\",",
            "pg_get_constraintdef(pgc.oid) AS \"definition\",",
            "pgc.condeferrable AS \"isDeferrable\",",
            "pgc.condeferred AS \"initiallyDeferred\"",
            "FROM information_schema.table_constraints c",
            "LEFT JOIN information_schema.referential_constraints r",
            "ON c.constraint_catalog = r.constraint_catalog AND c.constraint_schema = r.constraint_schema",
            "AND c.constraint_name = r.constraint_name",
            "LEFT JOIN information_schema.key_column_usage kcu",
            "ON c.constraint_catalog = kcu.constraint_catalog AND c.constraint_schema = kcu.constraint_schema",
            "AND c.constraint_name = kcu.constraint_name",
            "LEFT JOIN information_schema.constraint_column_usage ccu",
            "ON r.constraint_catalog = ccu.constraint_catalog AND r.constraint_schema = ccu.constraint_schema",
            "AND r.constraint_name = ccu.constraint_name",
            "LEFT JOIN pg_catalog.pg_constraint pgc",
            "ON pgc.conname = c.constraint_name",
            "AND pgc.conrelid = format('%I.%I', c.table_schema, c.table_name)::regclass",
            format!(
                "WHERE c.table_name = {} AND c.table_schema = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            options
                .column_name
                .as_deref()
                .map(|c| format!("AND kcu.column_name = {}", self.escape_str(c))),
            options
                .constraint_name
                .as_deref()
                .map(|n| format!("AND c.constraint_name = {}", self.escape_str(n))),
            options
                .constraint_type
                .map(|t| format!("AND c.constraint_type = {}", self.escape_str(t.as_sql()))),
            "ORDER BY c.constraint_name, kcu.ordinal_position, ccu.column_name;",
        ]);
        debug!("{} show_constraints_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn show_indexes_query(&self, table: &TableName) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let sql = join_sql_fragments(fragments![
            "SELECT i.relname AS name,",
            "ix.indisprimary AS primary,",
            "ix.indisunique AS unique,",
            "ARRAY(SELECT a.attname FROM unnest(ix.indkey[0:ix.indnkeyatts - 1]) WITH ORDINALITY AS k(attnum, ord)",
            "JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum ORDER BY k.ord) AS index_fields,",
            "ARRAY(SELECT a.attname FROM unnest(ix.indkey[ix.indnkeyatts:]) WITH ORDINALITY AS k(attnum, ord)",
            "JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum ORDER BY k.ord) AS include_fields,",
            "pg_get_indexdef(ix.indexrelid) AS definition",
            "FROM pg_catalog.pg_index ix",
            "JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid",
            "JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid",
            "JOIN pg_catalog.pg_namespace s ON s.oid = t.relnamespace",
            format!(
                "WHERE t.relkind IN ('r', 'p') AND t.relname = {} AND s.nspname = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            "ORDER BY i.relname;",
        ]);
        debug!("{} show_indexes_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn get_foreign_key_query(&self, table: &TableName, column: Option<&str>) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let sql = join_sql_fragments(fragments![
            "SELECT c.conname AS \"constraintName\",",
            "n.nspname AS \"constraintSchema\",",
            "n.nspname AS \"tableSchema\",",
            "t.relname AS \"tableName\",",
            "a.attname AS \"columnName\",",
            "fn.nspname AS \"referencedTableSchema\",",
            "ft.relname AS \"referencedTableName\",",
            "fa.attname AS \"referencedColumnName\",",
            format!("{} AS \"deleteAction\",", referential_action_case("c.confdeltype")),
            format!("{} AS \"updateAction\",", referential_action_case("c.confupdtype")),
            "c.condeferrable AS \"isDeferrable\",",
            "c.condeferred AS \"initiallyDeferred\"",
            "FROM pg_catalog.pg_constraint c",
            "CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(attnum, ref_attnum, ord)",
            "JOIN pg_catalog.pg_class t ON t.oid = c.conrelid",
            "JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace",
            "JOIN pg_catalog.pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum",
            "JOIN pg_catalog.pg_class ft ON ft.oid = c.confrelid",
            "JOIN pg_catalog.pg_namespace fn ON fn.oid = ft.relnamespace",
            "JOIN pg_catalog.pg_attribute fa ON fa.attrelid = c.confrelid AND fa.attnum = k.ref_attnum",
            format!(
                "WHERE c.contype = 'f' AND t.relname = {} AND n.nspname = {}",
                self.escape_str(&table.table_name),
                self.escape_str(&table.schema)
            ),
            column.map(|c| format!("AND a.attname = {}", self.escape_str(c))),
            "ORDER BY c.conname, k.ord;",
        ]);
        debug!("{} get_foreign_key_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn version_query(&self) -> Result<String> {
        Ok("SHOW SERVER_VERSION".to_string())
    }

    fn version_field(&self) -> &'static str {
        "server_version"
    }

    fn remove_index_query(
        &self,
        table: &TableName,
        index: &IndexRef,
        options: &RemoveIndexOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        if options.cascade && options.concurrently {
            return Err(QueryGenError::Config(
                "DROP INDEX cannot combine cascade and concurrently".into(),
            ));
        }

        let table = self.extract_table_details(table)?;
        let name = self.index_name(&table, index)?;
        // Indexes live in the schema of their table
        let index = TableReference {
            table_name: name,
            schema: table.schema.clone(),
        };

        let sql = join_sql_fragments(fragments![
            "DROP INDEX",
            options.concurrently.then_some("CONCURRENTLY"),
            options.if_exists.then_some("IF EXISTS"),
            self.quote_table(&index),
            options.cascade.then_some("CASCADE"),
            ";",
        ]);
        debug!("{} remove_index_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn drop_foreign_key_query(&self, table: &TableName, constraint: &str) -> Result<String> {
        let table = self.extract_table_details(table)?;
        validate_identifier(constraint)?;
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.quote_table(&table),
            self.quote_identifier(constraint)
        ))
    }

    fn rename_table_query(&self, before: &TableName, after: &TableName) -> Result<String> {
        let before = self.extract_table_details(before)?;
        let after = self.extract_table_details(after)?;

        if before.schema == after.schema {
            return Ok(format!(
                "ALTER TABLE {} RENAME TO {};",
                self.quote_table(&before),
                self.quote_identifier(&after.table_name)
            ));
        }
        if before.table_name == after.table_name {
            return Ok(format!(
                "ALTER TABLE {} SET SCHEMA {};",
                self.quote_table(&before),
                self.quote_identifier(&after.schema)
            ));
        }
        Err(QueryGenError::Config(format!(
            "Cannot move table {} to schema {} and rename it in one statement",
            before.table_name, after.schema
        )))
    }

    fn change_columns_query(
        &self,
        table: &TableName,
        columns: &ChangeColumnDefinitions,
    ) -> Result<String> {
        let table = self.extract_table_details(table)?;
        let columns = normalize_change_columns(columns)?;

        let mut sequences = Vec::new();
        let mut enum_creates = Vec::new();
        let mut alter_clauses = Vec::new();
        let mut enum_swaps = Vec::new();
        let mut comments = Vec::new();

        for (column, def) in &columns {
            let change = self.column_change(&table, column, def)?;
            if change.alter_clauses.is_empty() && change.comments.is_empty() {
                return Err(QueryGenError::Config(format!(
                    "No changes requested for column {:?}",
                    column
                )));
            }
            sequences.extend(change.sequences);
            enum_creates.extend(change.enum_creates);
            alter_clauses.extend(change.alter_clauses);
            enum_swaps.extend(change.enum_swaps);
            comments.extend(change.comments);
        }

        let alter = if alter_clauses.is_empty() {
            None
        } else {
            Some(format!(
                "ALTER TABLE {} {}",
                self.quote_table(&table),
                alter_clauses.join(", ")
            ))
        };

        let sql = join_statements(
            sequences
                .into_iter()
                .chain(enum_creates)
                .chain(alter)
                .chain(enum_swaps)
                .chain(comments),
        );
        debug!("{} change_columns_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn set_constraint_checking_query(&self, checking: &ConstraintChecking) -> Result<String> {
        let target = if checking.constraints().is_empty() {
            "ALL".to_string()
        } else {
            for name in checking.constraints() {
                validate_identifier(name)?;
            }
            checking
                .constraints()
                .iter()
                .map(|name| self.quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        Ok(format!("SET CONSTRAINTS {} {};", target, checking.mode()))
    }

    fn json_path_extraction_query(
        &self,
        sql_expression: &str,
        path: &[JsonPathSegment],
        unquote: bool,
    ) -> Result<String> {
        let (operator, path_sql) = match path {
            [] => {
                return Err(QueryGenError::Config(
                    "JSON path extraction requires at least one path segment".into(),
                ))
            }
            [segment] => {
                let path_sql = match segment {
                    JsonPathSegment::Index(i) => i.to_string(),
                    JsonPathSegment::Key(key) => self.escape_str(key),
                };
                (if unquote { "->>" } else { "->" }, path_sql)
            }
            // #> requires a text[] even for array indexes
            segments => (
                if unquote { "#>>" } else { "#>" },
                self.escape(&SqlValue::text_array(segments.iter().map(|s| s.to_string()))),
            ),
        };
        Ok(format!("{}{}{}", sql_expression, operator, path_sql))
    }

    fn format_unquote_json(&self, arg: &SqlExpression<'_>, options: EscapeOptions) -> Result<String> {
        let escaped = match arg {
            SqlExpression::Value(_) if options.cast_json => {
                format!("{}::jsonb", self.escape_expression(arg))
            }
            _ => self.escape_expression(arg),
        };
        Ok(format!("{}#>>ARRAY[]::TEXT[]", escaped))
    }

    fn as_enum_generator(&self) -> Option<&dyn EnumQueryGenerator> {
        Some(self)
    }
}
