//! Identifier validation and quoting.
//!
//! SQL identifiers (table names, column names, schema names, type names) cannot
//! be bound as parameters, so every generator builds them into the SQL text.
//! All identifiers pass through this module:
//!
//! 1. Validate for suspicious patterns (null bytes, excessive length)
//! 2. Apply dialect quoting (double quotes or backticks)
//! 3. Escape the quote character inside the name by doubling it

use crate::error::{QueryGenError, Result};

/// Maximum identifier length accepted before quoting.
/// - PostgreSQL: 63 bytes (longer names are truncated by the server)
/// - MariaDB: 64 characters
///
/// Validation is deliberately looser than either engine; name generation
/// enforces the per-dialect limit.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding [`MAX_IDENTIFIER_LENGTH`]
///
/// # Errors
///
/// Returns `QueryGenError::Config` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(QueryGenError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(QueryGenError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(QueryGenError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// ```ignore
/// assert_eq!(quote_pg("users"), "\"users\"");
/// assert_eq!(quote_pg("table\"name"), "\"table\"\"name\"");
/// ```
pub fn quote_pg(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a MariaDB identifier using backticks.
///
/// ```ignore
/// assert_eq!(quote_mariadb("users"), "`users`");
/// assert_eq!(quote_mariadb("table`name"), "`table``name`");
/// ```
pub fn quote_mariadb(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("Table123").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let result = validate_identifier(&long_name);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_validate_identifier_accepts_max_length() {
        let max_name = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(validate_identifier(&max_name).is_ok());
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_quote_pg_escapes_double_quote() {
        assert_eq!(quote_pg("users"), "\"users\"");
        assert_eq!(quote_pg("table\"name"), "\"table\"\"name\"");
        assert_eq!(quote_pg("a\"b\"c"), "\"a\"\"b\"\"c\"");
    }

    #[test]
    fn test_quote_pg_sql_injection_safely_quoted() {
        assert_eq!(
            quote_pg("Robert'); DROP TABLE Students;--"),
            "\"Robert'); DROP TABLE Students;--\""
        );
    }

    #[test]
    fn test_quote_mariadb_escapes_backtick() {
        assert_eq!(quote_mariadb("users"), "`users`");
        assert_eq!(quote_mariadb("table`name"), "`table``name`");
    }

    #[test]
    fn test_quote_mariadb_sql_injection_safely_quoted() {
        assert_eq!(
            quote_mariadb("Robert`); DROP TABLE Students;--"),
            "`Robert``); DROP TABLE Students;--`"
        );
    }
}
