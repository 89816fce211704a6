//! Enum type lifecycle for PostgreSQL.

use tracing::{debug, warn};

use crate::core::fragments::{join_sql_fragments, join_statements};
use crate::core::options::{check_options, AddValueOptions, CreateEnumOptions, ListEnumsOptions};
use crate::core::schema::{DataType, TableName};
use crate::core::traits::{EnumQueryGenerator, QueryGenerator};
use crate::error::{QueryGenError, Result};
use crate::fragments;

use super::PostgresQueryGenerator;

impl EnumQueryGenerator for PostgresQueryGenerator {
    fn create_enum_query(
        &self,
        name: &TableName,
        data_type: &DataType,
        options: &CreateEnumOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let values = data_type.enum_values().ok_or_else(|| {
            QueryGenError::TypeMismatch(format!(
                "create_enum_query expects an ENUM type, got {:?}",
                data_type
            ))
        })?;
        if values.is_empty() {
            return Err(QueryGenError::TypeMismatch(
                "ENUM type requires at least one value".into(),
            ));
        }

        let name = self.extract_table_details(name)?;
        let quoted = self.quote_table(&name);
        let labels = values
            .iter()
            .map(|v| self.escape_str(v))
            .collect::<Vec<_>>()
            .join(", ");

        // CREATE TYPE has no IF NOT EXISTS; swallow duplicate_object instead
        let body = format!(
            "BEGIN CREATE TYPE {} AS ENUM({}); EXCEPTION WHEN duplicate_object THEN null; END",
            quoted, labels
        );
        let create = format!("DO {}", self.escape_str(&body));

        let sql = if options.force {
            join_statements([self.drop_enum_query_for(&quoted), create])
        } else {
            join_statements([create])
        };
        debug!("{} create_enum_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn drop_enum_query(&self, name: &TableName) -> Result<String> {
        let name = self.extract_table_details(name)?;
        Ok(self.drop_enum_query_for(&self.quote_table(&name)))
    }

    fn list_enums_query(&self, options: &ListEnumsOptions) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let schema = options
            .schema
            .as_deref()
            .unwrap_or_else(|| self.default_schema());

        let sql = join_sql_fragments(fragments![
            "SELECT t.typname enum_name, array_agg(e.enumlabel ORDER BY enumsortorder) enum_value",
            "FROM pg_type t",
            "JOIN pg_enum e ON t.oid = e.enumtypid",
            "JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace",
            format!("WHERE n.nspname = {}", self.escape_str(schema)),
            options
                .data_type
                .as_deref()
                .map(|name| format!("AND t.typname = {}", self.escape_str(name))),
            "GROUP BY 1 ORDER BY 1;",
        ]);
        debug!("{} list_enums_query: {}", self.name(), sql);
        Ok(sql)
    }

    fn add_value_to_enum_query(
        &self,
        name: &TableName,
        value: &str,
        options: &AddValueOptions,
    ) -> Result<String> {
        check_options(self.name(), self.supports(), options)?;
        let name = self.extract_table_details(name)?;

        let position = match (&options.before, &options.after) {
            (Some(before), Some(after)) => {
                warn!(
                    "add_value_to_enum_query: both before ({}) and after ({}) given, using before",
                    before, after
                );
                Some(format!("BEFORE {}", self.escape_str(before)))
            }
            (Some(before), None) => Some(format!("BEFORE {}", self.escape_str(before))),
            (None, Some(after)) => Some(format!("AFTER {}", self.escape_str(after))),
            (None, None) => None,
        };

        Ok(join_sql_fragments(fragments![
            "ALTER TYPE",
            self.quote_table(&name),
            "ADD VALUE IF NOT EXISTS",
            self.escape_str(value),
            position,
            ";",
        ]))
    }
}

impl PostgresQueryGenerator {
    fn drop_enum_query_for(&self, quoted: &str) -> String {
        format!("DROP TYPE IF EXISTS {};", quoted)
    }
}
