use tableschema_core::ValidationErrors;
use thiserror::Error;

/// Failures raised while building or mutating a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{0}")]
    Load(String),
    #[error("Schema failed validation: {0}")]
    ValidationFailed(ValidationErrors),
    #[error("structural validator unavailable: {0}")]
    Validator(String),
    #[error("unknown field name: {0}")]
    UnknownField(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Validation errors carried by this failure, if any.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
