//! SQL literal values and their dialect-specific escaping.
//!
//! Generators never interpolate caller data directly. Values are wrapped in
//! [`SqlValue`] and rendered through [`escape_pg`] or [`escape_mariadb`], which
//! produce self-contained SQL literals.

use std::borrow::Cow;
use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A literal value that can be embedded in generated SQL.
///
/// Uses `Cow` for string and byte data so borrowed input can be escaped
/// without an intermediate copy.
///
/// ```rust
/// use std::borrow::Cow;
/// use querygen::core::SqlValue;
///
/// let borrowed: SqlValue<'_> = SqlValue::Text(Cow::Borrowed("hello"));
/// let owned: SqlValue<'static> = borrowed.into_owned();
/// assert!(!owned.is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value (all integer widths widen to i64).
    I64(i64),

    /// Floating point value.
    F64(f64),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Text data.
    Text(Cow<'a, str>),

    /// Binary data.
    Bytes(Cow<'a, [u8]>),

    /// UUID value.
    Uuid(Uuid),

    /// Date without time component.
    Date(NaiveDate),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// JSON document, rendered as its serialized text.
    Json(serde_json::Value),

    /// Array of values (`ARRAY[...]` in PostgreSQL, a comma list in MariaDB).
    Array(Vec<SqlValue<'a>>),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(v) => SqlValue::Bool(v),
            SqlValue::I64(v) => SqlValue::I64(v),
            SqlValue::F64(v) => SqlValue::F64(v),
            SqlValue::Decimal(v) => SqlValue::Decimal(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
            SqlValue::Uuid(v) => SqlValue::Uuid(v),
            SqlValue::Date(v) => SqlValue::Date(v),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
            SqlValue::DateTimeOffset(v) => SqlValue::DateTimeOffset(v),
            SqlValue::Json(v) => SqlValue::Json(v),
            SqlValue::Array(v) => SqlValue::Array(v.into_iter().map(SqlValue::into_owned).collect()),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Create a text value from a borrowed string slice.
    #[must_use]
    pub fn text(s: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(s))
    }

    /// Create an array of text values.
    #[must_use]
    pub fn text_array<I, S>(items: I) -> SqlValue<'static>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SqlValue::Array(
            items
                .into_iter()
                .map(|s| SqlValue::Text(Cow::Owned(s.into())))
                .collect(),
        )
    }
}

impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::I64(v as i64)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<usize> for SqlValue<'static> {
    fn from(v: usize) -> Self {
        SqlValue::I64(v as i64)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<Uuid> for SqlValue<'static> {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<serde_json::Value> for SqlValue<'static> {
    fn from(v: serde_json::Value) -> Self {
        SqlValue::Json(v)
    }
}

impl<'a, T: Into<SqlValue<'a>>> From<Option<T>> for SqlValue<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Escape a value as a PostgreSQL literal.
///
/// Strings use standard-conforming quoting (single quotes doubled). PostgreSQL
/// text cannot hold NUL, so NUL characters are written as the two characters
/// `\0`.
pub fn escape_pg(value: &SqlValue<'_>) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::I64(v) => v.to_string(),
        SqlValue::F64(v) => format_float(*v),
        SqlValue::Decimal(v) => v.to_string(),
        SqlValue::Text(s) => quote_pg_string(s),
        SqlValue::Bytes(b) => format!("'\\x{}'", hex(b)),
        SqlValue::Uuid(u) => format!("'{}'", u),
        SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        SqlValue::DateTimeOffset(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f %:z")),
        SqlValue::Json(j) => quote_pg_string(&j.to_string()),
        SqlValue::Array(items) => format!(
            "ARRAY[{}]",
            items.iter().map(escape_pg).collect::<Vec<_>>().join(",")
        ),
    }
}

/// Escape a value as a MariaDB literal.
///
/// Strings use backslash escaping, which MariaDB honors unless the
/// `NO_BACKSLASH_ESCAPES` SQL mode is active.
pub fn escape_mariadb(value: &SqlValue<'_>) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::I64(v) => v.to_string(),
        SqlValue::F64(v) => format_float(*v),
        SqlValue::Decimal(v) => v.to_string(),
        SqlValue::Text(s) => quote_mariadb_string(s),
        SqlValue::Bytes(b) => format!("X'{}'", hex(b)),
        SqlValue::Uuid(u) => format!("'{}'", u),
        SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        // MariaDB DATETIME has no zone; normalize to UTC
        SqlValue::DateTimeOffset(dt) => format!(
            "'{}'",
            dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.3f")
        ),
        SqlValue::Json(j) => quote_mariadb_string(&j.to_string()),
        SqlValue::Array(items) => items
            .iter()
            .map(escape_mariadb)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn quote_pg_string(s: &str) -> String {
    let escaped = s.replace('\'', "''").replace('\0', "\\0");
    format!("'{}'", escaped)
}

fn quote_mariadb_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "'NaN'".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        v.to_string()
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}
