//! Schema descriptors consumed by the query generators.
//!
//! These are short-lived values built per call: table references, abstract
//! data types, column change definitions, index references, JSON paths and
//! SQL expressions. Nothing here is cached or persisted.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QueryGenError, Result};

use super::value::SqlValue;

/// A table as named by the caller: bare name plus optional schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    /// Table (or type) name.
    pub table_name: String,

    /// Schema; `None` means "use the dialect default".
    #[serde(default)]
    pub schema: Option<String>,
}

impl TableName {
    /// Create an unqualified table name.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: None,
        }
    }

    /// Create a schema-qualified table name.
    pub fn with_schema(schema: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: Some(schema.into()),
        }
    }

    /// Build a table name from a model descriptor.
    pub fn from_model<M: ModelDescriptor + ?Sized>(model: &M) -> Self {
        Self {
            table_name: model.table_name().to_string(),
            schema: model.schema().map(str::to_string),
        }
    }
}

/// Splits `schema.table` on the first dot; a leading dot is not a schema.
impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) if !schema.is_empty() => Self::with_schema(schema, table),
            _ => Self::new(name),
        }
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        TableName::from(name.as_str())
    }
}

impl From<(&str, &str)> for TableName {
    fn from((schema, table): (&str, &str)) -> Self {
        Self::with_schema(schema, table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table_name),
            None => write!(f, "{}", self.table_name),
        }
    }
}

/// Anything the model layer can hand us in place of a table name.
pub trait ModelDescriptor {
    /// Table name the model maps to.
    fn table_name(&self) -> &str;

    /// Schema the model lives in, if not the default.
    fn schema(&self) -> Option<&str> {
        None
    }
}

/// A table name with the schema resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableReference {
    /// Table name.
    pub table_name: String,

    /// Resolved schema.
    pub schema: String,
}

/// Index to remove: explicit name, or the columns it was created on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRef {
    /// Explicit index name.
    Name(String),

    /// Column list; the index name is derived with `generate_index_name`.
    Fields(Vec<String>),
}

impl From<&str> for IndexRef {
    fn from(name: &str) -> Self {
        IndexRef::Name(name.to_string())
    }
}

impl From<Vec<&str>> for IndexRef {
    fn from(fields: Vec<&str>) -> Self {
        IndexRef::Fields(fields.into_iter().map(str::to_string).collect())
    }
}

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonPathSegment {
    /// Array index.
    Index(usize),

    /// Object key.
    Key(String),
}

impl From<usize> for JsonPathSegment {
    fn from(i: usize) -> Self {
        JsonPathSegment::Index(i)
    }
}

impl From<&str> for JsonPathSegment {
    fn from(k: &str) -> Self {
        JsonPathSegment::Key(k.to_string())
    }
}

impl fmt::Display for JsonPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonPathSegment::Index(i) => write!(f, "{}", i),
            JsonPathSegment::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Argument to expression-building operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpression<'a> {
    /// Already-rendered SQL, used verbatim.
    Raw(String),

    /// A literal to be escaped by the dialect.
    Value(SqlValue<'a>),
}

/// Options for escaping an expression argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeOptions {
    /// Treat a literal value as a JSON document (PostgreSQL adds `::jsonb`).
    pub cast_json: bool,
}

/// Abstract column data types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    String { length: Option<u32> },
    Text,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Json,
    Jsonb,
    Enum { values: Vec<String> },
    Array(Box<DataType>),
    /// Dialect-specific type text, emitted verbatim.
    Raw(String),
}

impl DataType {
    /// Create an ENUM type from its labels.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Labels of an ENUM or array-of-ENUM type.
    pub fn enum_values(&self) -> Option<&[String]> {
        match self {
            DataType::Enum { values } => Some(values),
            DataType::Array(inner) => match inner.as_ref() {
                DataType::Enum { values } => Some(values),
                _ => None,
            },
            _ => None,
        }
    }

    /// True for an array whose element type is an ENUM.
    pub fn is_enum_array(&self) -> bool {
        matches!(self, DataType::Array(inner) if matches!(inner.as_ref(), DataType::Enum { .. }))
    }
}

/// Named enumerated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Type name (optionally schema-qualified).
    pub name: TableName,

    /// Ordered labels.
    pub values: Vec<String>,
}

impl EnumDescriptor {
    /// Descriptor for an ENUM (or array of ENUM) column type.
    pub fn from_data_type(name: TableName, data_type: &DataType) -> Option<Self> {
        data_type.enum_values().map(|values| Self {
            name,
            values: values.to_vec(),
        })
    }

    /// The descriptor as an abstract ENUM data type.
    pub fn data_type(&self) -> DataType {
        DataType::Enum {
            values: self.values.clone(),
        }
    }
}

/// Deferral mode for `SET CONSTRAINTS`.
///
/// An empty name list applies to all deferrable constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintChecking {
    Deferred(Vec<String>),
    Immediate(Vec<String>),
}

impl ConstraintChecking {
    pub fn mode(&self) -> &'static str {
        match self {
            ConstraintChecking::Deferred(_) => "DEFERRED",
            ConstraintChecking::Immediate(_) => "IMMEDIATE",
        }
    }

    pub fn constraints(&self) -> &[String] {
        match self {
            ConstraintChecking::Deferred(names) | ConstraintChecking::Immediate(names) => names,
        }
    }
}

/// Default value change for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Set the default to a literal.
    Value(SqlValue<'static>),

    /// Set the default to a raw SQL expression (e.g. `now()`).
    Expression(String),

    /// Remove the default.
    Drop,
}

/// ON DELETE / ON UPDATE behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    /// SQL keyword(s) for the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// Foreign key target for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyReference {
    /// Referenced table.
    pub table: TableName,

    /// Referenced column (defaults to `id`).
    pub column: Option<String>,

    pub on_delete: Option<ReferentialAction>,

    pub on_update: Option<ReferentialAction>,
}

/// New definition for an existing column.
///
/// Unset fields leave that aspect of the column untouched (where the dialect
/// allows it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeColumnDefinition {
    pub data_type: Option<DataType>,
    pub allow_null: Option<bool>,
    pub default_value: Option<DefaultValue>,
    pub auto_increment: Option<bool>,
    /// New comment; an empty string removes the comment.
    pub comment: Option<String>,
    pub unique: Option<bool>,
    pub references: Option<ForeignKeyReference>,
}

impl ChangeColumnDefinition {
    /// Start a definition that changes the column type.
    pub fn of_type(data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::default()
        }
    }

    /// Set nullability.
    #[must_use]
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = Some(allow);
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark the column as auto-increment.
    #[must_use]
    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    /// Set the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Add a unique constraint on the column.
    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Add a foreign key on the column.
    #[must_use]
    pub fn references(mut self, reference: ForeignKeyReference) -> Self {
        self.references = Some(reference);
        self
    }

    /// True when the column is being switched to auto-increment.
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment == Some(true)
    }

    /// Bring the definition into the shape DDL synthesis expects.
    ///
    /// An auto-increment column is implicitly NOT NULL and its default is
    /// owned by the sequence, so an explicit default is rejected.
    pub fn normalize(mut self, column: &str) -> Result<Self> {
        if self.is_auto_increment() {
            if matches!(
                self.default_value,
                Some(DefaultValue::Value(_)) | Some(DefaultValue::Expression(_))
            ) {
                return Err(QueryGenError::Config(format!(
                    "Column {:?} cannot be auto-increment and have a default value",
                    column
                )));
            }
            if self.allow_null == Some(true) {
                return Err(QueryGenError::Config(format!(
                    "Column {:?} cannot be auto-increment and nullable",
                    column
                )));
            }
            self.allow_null = Some(false);
        }
        Ok(self)
    }
}

/// Column name → new definition, in caller order.
pub type ChangeColumnDefinitions = IndexMap<String, ChangeColumnDefinition>;

/// Validate and normalize every definition in a change set.
pub fn normalize_change_columns(
    definitions: &ChangeColumnDefinitions,
) -> Result<Vec<(String, ChangeColumnDefinition)>> {
    if definitions.is_empty() {
        return Err(QueryGenError::Config(
            "change_columns_query requires at least one column definition".into(),
        ));
    }

    definitions
        .iter()
        .map(|(name, def)| Ok((name.clone(), def.clone().normalize(name)?)))
        .collect()
}
