use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::value::display_raw;

/// Every validation failure carries its kind, a message, and where applicable
/// the field, the offending raw value and the 1-based data row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{message}")]
    LoadFailed { message: String },
    #[error("{message}")]
    SchemaViolation { message: String },
    #[error("{field}: {message} ({})", display_raw(.value))]
    FieldValidation {
        field: String,
        value: JsonValue,
        message: String,
    },
    #[error("row {row} {field}: {message} ({})", display_raw(.value))]
    RowFieldValidation {
        row: usize,
        field: String,
        value: JsonValue,
        message: String,
    },
    #[error("row {row}: {message}")]
    RowValidation { row: usize, message: String },
}

impl ValidationError {
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    pub fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    pub fn field(field: impl Into<String>, value: JsonValue, message: impl Into<String>) -> Self {
        Self::FieldValidation {
            field: field.into(),
            value,
            message: message.into(),
        }
    }

    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self::RowValidation {
            row,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoadFailed { .. } => ErrorKind::LoadFailed,
            Self::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            Self::FieldValidation { .. } => ErrorKind::FieldValidation,
            Self::RowFieldValidation { .. } => ErrorKind::RowFieldValidation,
            Self::RowValidation { .. } => ErrorKind::RowValidation,
        }
    }

    /// Attach a data row number to a field-level error.
    pub fn in_row(self, row: usize) -> Self {
        match self {
            Self::FieldValidation {
                field,
                value,
                message,
            } => Self::RowFieldValidation {
                row,
                field,
                value,
                message,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LoadFailed,
    SchemaViolation,
    FieldValidation,
    RowFieldValidation,
    RowValidation,
}

/// Non-empty list of validation errors, rendered joined by `", "`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_messages(&self.0))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn messages_follow_kind_formats() {
        let field = ValidationError::field("id", json!("foo"), "value must be numeric");
        assert_eq!(field.to_string(), "id: value must be numeric (foo)");
        assert_eq!(
            field.clone().in_row(3).to_string(),
            "row 3 id: value must be numeric (foo)"
        );
        assert_eq!(
            ValidationError::row(2, "Invalid row: a, b").to_string(),
            "row 2: Invalid row: a, b"
        );
        assert_eq!(
            ValidationError::schema_violation("[fields] is required").to_string(),
            "[fields] is required"
        );
    }

    #[test]
    fn non_string_values_render_as_json() {
        let error = ValidationError::field("flag", json!(1), "value must be a bool or string");
        assert_eq!(error.to_string(), "flag: value must be a bool or string (1)");
    }

    #[test]
    fn list_joins_with_comma() {
        let errors = ValidationErrors(vec![
            ValidationError::load_failed("a"),
            ValidationError::load_failed("b"),
        ]);
        assert_eq!(errors.to_string(), "a, b");
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
