//! Error types for the compatibility registry

use thiserror::Error;

use crate::store::StoreError;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Registry errors
///
/// Every variant except `Store` is a client-input error.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid compatibility level: {0}")]
    InvalidCompatibilityLevel(String),

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {subject} version {selector}")]
    VersionNotFound { subject: String, selector: String },

    #[error("Invalid Avro schema: {0}")]
    InvalidAvroSchema(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SchemaError::InvalidCompatibilityLevel(_)
                | SchemaError::SubjectNotFound(_)
                | SchemaError::VersionNotFound { .. }
                | SchemaError::InvalidAvroSchema(_)
        )
    }
}
