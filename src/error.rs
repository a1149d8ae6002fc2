use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TabularError>;

#[derive(Error, Debug)]
/// Tabular encoding error
pub enum TabularError {
    #[error("Configuration: {0}")]
    Configuration(String),

    #[error("Accessor for column `{column}` failed: {reason}")]
    Access { column: String, reason: String },

    #[error("Sink: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table write cancelled")]
    Cancelled,
}

impl TabularError {
    pub(crate) fn access(column: &str, reason: impl ToString) -> Self {
        TabularError::Access {
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }
}
