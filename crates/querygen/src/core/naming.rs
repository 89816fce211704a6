//! Deterministic names for generated database objects, and JSON path tokens.
//!
//! Index, enum type and sequence names are derived from the table and column
//! names so that the same inputs always map to the same object. Names that
//! exceed the dialect's identifier limit are shortened with a hash suffix
//! instead of being silently truncated by the server.

use sha2::{Digest, Sha256};

use super::schema::{JsonPathSegment, TableReference};

/// Length of the hex hash suffix appended to shortened names.
const HASH_SUFFIX_LEN: usize = 8;

/// Smallest identifier limit that still leaves room for a hashed name.
pub const MIN_HASHED_IDENTIFIER_LENGTH: usize = HASH_SUFFIX_LEN + 2;

/// Convert `camelCase` / `PascalCase` to `snake_case`.
///
/// Separators (space, `-`, `.`) become underscores.
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower_or_digit = false;
        } else if c == ' ' || c == '-' || c == '.' {
            out.push('_');
            prev_lower_or_digit = false;
        } else {
            out.push(c);
            prev_lower_or_digit = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Shorten `name` to at most `max_len` bytes, keeping it unique.
///
/// Over-long names keep a prefix and gain `_` plus the first 8 hex digits of
/// the SHA-256 of the full name. Limits too small for the suffix truncate.
pub fn fit_identifier(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }
    if max_len < MIN_HASHED_IDENTIFIER_LENGTH {
        return name[..floor_char_boundary(name, max_len)].to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let hash: String = digest
        .iter()
        .take(HASH_SUFFIX_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect();

    let cut = floor_char_boundary(name, max_len - HASH_SUFFIX_LEN - 1);
    format!("{}_{}", &name[..cut], hash)
}

fn floor_char_boundary(name: &str, mut index: usize) -> usize {
    while !name.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Index name for a set of columns: `{table}_{col1}_{col2}`.
pub fn generate_index_name(table: &TableReference, fields: &[String], max_len: usize) -> String {
    let joined = std::iter::once(table.table_name.as_str())
        .chain(fields.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("_");
    fit_identifier(&underscore(&joined), max_len)
}

/// Enum type name for a column: `enum_{table}_{column}`.
///
/// With `replacement`, the temporary name used while a column's enum type is
/// being swapped. Both forms are fitted to `max_len` from their full text, so
/// a shortened replacement name never collides with the canonical one.
pub fn generate_enum_name(
    table_name: &str,
    column: &str,
    replacement: bool,
    max_len: usize,
) -> String {
    let name = if replacement {
        format!("enum_{}_{}_replacement", table_name, column)
    } else {
        format!("enum_{}_{}", table_name, column)
    };
    fit_identifier(&name, max_len)
}

/// Sequence backing an auto-increment column: `{table}_{column}_seq`.
pub fn generate_sequence_name(table_name: &str, column: &str, max_len: usize) -> String {
    fit_identifier(&format!("{}_{}_seq", table_name, column), max_len)
}

fn is_plain_json_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Dialect-neutral JSON path string: `$.key[0]."odd key"`.
///
/// Keys that are not plain identifiers are double-quoted with `"` and `\`
/// backslash-escaped. The result still has to be escaped as a string literal.
pub fn build_json_path(path: &[JsonPathSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            JsonPathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            JsonPathSegment::Key(key) if is_plain_json_key(key) => {
                out.push('.');
                out.push_str(key);
            }
            JsonPathSegment::Key(key) => {
                out.push_str(".\"");
                out.push_str(&key.replace('\\', "\\\\").replace('"', "\\\""));
                out.push('"');
            }
        }
    }
    out
}
