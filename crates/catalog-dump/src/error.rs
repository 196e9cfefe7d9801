//! Error types for the catalog dump library.

use thiserror::Error;

/// Main error type for catalog dump operations.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog connection or query execution error
    #[error("Catalog error: {0}")]
    Catalog(#[from] tokio_postgres::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A catalog query for one object class failed
    #[error("Query for {object_class} failed: {message}")]
    Query {
        object_class: String,
        message: String,
    },

    /// A catalog row could not be decoded into its typed record
    #[error("Cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The engine version string could not be understood
    #[error("Unsupported engine version: {0}")]
    Version(String),

    /// IO error (metadata or TOC file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DumpError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        DumpError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Query error for an object class
    pub fn query(object_class: impl Into<String>, message: impl ToString) -> Self {
        DumpError::Query {
            object_class: object_class.into(),
            message: message.to_string(),
        }
    }

    /// Create a Decode error for a column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        DumpError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DumpError::Config(_) | DumpError::Yaml(_) => 2,
            DumpError::Catalog(_)
            | DumpError::Pool { .. }
            | DumpError::Query { .. }
            | DumpError::Decode { .. }
            | DumpError::Version(_) => 3,
            DumpError::Io(_) => 4,
            DumpError::Json(_) => 1,
        }
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

/// Result type alias for catalog dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(DumpError::Config("x".into()).exit_code(), 2);
        assert_eq!(DumpError::query("indexes", "boom").exit_code(), 3);
        assert_eq!(DumpError::Version("9".into()).exit_code(), 3);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(DumpError::from(io).exit_code(), 4);
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = DumpError::decode("oid", "expected oid, got text");
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Cannot decode column 'oid'"));
    }
}
