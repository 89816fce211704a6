//! Error types for query generation.

use thiserror::Error;

/// Boxed error returned by a raw-query executor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for query generation.
#[derive(Error, Debug)]
pub enum QueryGenError {
    /// Invalid or incompatible option combination, bad configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Options not supported by the active dialect for an operation.
    #[error(
        "The following options are not supported by {operation} in {dialect}: {}",
        options.join(", ")
    )]
    InvalidOptions {
        operation: String,
        dialect: String,
        options: Vec<String>,
    },

    /// An operation received a value of the wrong abstract type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The active dialect does not implement the operation.
    #[error("{operation} is not supported by the {dialect} dialect")]
    Unsupported { operation: String, dialect: String },

    /// A query result did not have the expected shape.
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The raw-query executor reported an error.
    #[error("Query execution failed: {0}")]
    Execution(#[source] BoxError),

    /// IO error (config file loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error (row decoding)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryGenError {
    /// Create an Unsupported error for an operation on a dialect.
    pub fn unsupported(operation: impl Into<String>, dialect: impl Into<String>) -> Self {
        QueryGenError::Unsupported {
            operation: operation.into(),
            dialect: dialect.into(),
        }
    }

    /// True for errors caused by the caller's options or configuration.
    ///
    /// These are raised before any SQL is produced and are never retried.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            QueryGenError::Config(_) | QueryGenError::InvalidOptions { .. }
        )
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for query generation.
pub type Result<T> = std::result::Result<T, QueryGenError>;
