use std::fmt;

use tableschema_core::{ValidationError, ValidationErrors, join_messages};
use tableschema_schema::SchemaError;
use thiserror::Error;

/// Failure while reading rows, optionally tied to a row or line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceError {
    pub row: Option<usize>,
    pub message: String,
}

impl DataSourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            row: None,
            message: message.into(),
        }
    }

    pub fn at_row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            message: message.into(),
        }
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) if row > 0 => write!(f, "row {row}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Unsupported or malformed CSV dialect input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialectError {
    #[error("custom line terminators are not supported ({0:?})")]
    UnsupportedLineTerminator(String),
    #[error("delimiter must be exactly one character ({0:?})")]
    InvalidDelimiter(String),
    #[error("quoteChar must be exactly one character ({0:?})")]
    InvalidQuoteChar(String),
    #[error("escapeChar must be exactly one character ({0:?})")]
    InvalidEscapeChar(String),
    #[error("custom nullSequence is not supported")]
    NullSequenceUnsupported,
    #[error("Invalid csv file - escape character at end of line")]
    EscapeAtEndOfLine,
    #[error(
        "Invalid csv file - if field is not enclosed with double quotes - then double quotes may not appear inside the field"
    )]
    QuoteInUnenclosedField,
    #[error("Invalid csv file - unexpected character after a closing quote")]
    TextAfterClosingQuote,
    #[error("Invalid csv file - line must not end with a comma")]
    TrailingDelimiter,
}

/// Errors emitted while streaming a table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("{}", row_field_messages(.row, .errors))]
    FieldValidation { row: usize, errors: ValidationErrors },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Dialect(#[from] DialectError),
    #[error("table can only be rewound before the first row or after the last one")]
    RewindUnsupported,
    #[error("schema could not be inferred")]
    InferenceIncomplete,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl TableError {
    /// Structured form of the failure, numbering row errors with `row` when
    /// the error does not carry its own number.
    pub fn into_validation_errors(self, row: usize) -> Vec<ValidationError> {
        match self {
            Self::FieldValidation { row, errors } => errors
                .into_iter()
                .map(|error| error.in_row(row))
                .collect(),
            Self::DataSource(error) => {
                let row = error.row.filter(|number| *number > 0).unwrap_or(row);
                vec![ValidationError::row(row, error.message)]
            }
            other => vec![ValidationError::load_failed(other.to_string())],
        }
    }
}

fn row_field_messages(row: &usize, errors: &ValidationErrors) -> String {
    let errors: Vec<ValidationError> = errors.iter().cloned().map(|error| error.in_row(*row)).collect();
    join_messages(&errors)
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
