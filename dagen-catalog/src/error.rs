use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failure talking to, or reading from, the database catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to connect to the database: {message}")]
    Connection { message: String },

    #[error("catalog query failed: {message}")]
    Query { message: String },

    #[error("catalog row is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' holds {found}, expected {expected}")]
    UnexpectedValue {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("catalog call timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl CatalogError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}
