//! Feed parsing error types.
//!
//! These errors describe what is wrong with a header or a data line. They
//! never touch the file system; the store wraps them into
//! [`TransitError`](crate::store::TransitError) before they reach callers.

/// Error returned when a raw line cannot be split into fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    /// A quoted value was still open when the line ended.
    #[error("missing closing quote in field {field}")]
    UnterminatedQuote { field: usize },
}

/// Error returned when a header line does not match a file's schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The file has no header line at all.
    #[error("{file}: file is empty, expected a header line")]
    MissingHeader { file: &'static str },

    /// One or more required fields are absent from the header.
    #[error("{file}: header is missing required fields {missing:?}")]
    MissingRequired {
        file: &'static str,
        missing: Vec<&'static str>,
    },

    /// The header names a field that is neither required nor optional.
    #[error("{file}: header has unexpected field [{field}]")]
    UnexpectedField { file: &'static str, field: String },

    /// The header itself could not be tokenized.
    #[error("{file}: {source}")]
    Tokenize {
        file: &'static str,
        source: TokenizeError,
    },
}

/// Why a single field value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} needs to be a valid integer. Got: {value}")]
    Integer { field: &'static str, value: String },

    #[error("{field} needs to be a valid number. Got: {value}")]
    Number { field: &'static str, value: String },

    #[error("{field} needs to be a valid url or not provided. Got: {value}")]
    Url { field: &'static str, value: String },

    #[error("{field} needs to be a valid color. Got: {value}")]
    Color { field: &'static str, value: String },

    #[error("{field} needs to be one of {allowed}. Got: {value}")]
    Code {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("{field} needs to be in HH:MM:SS format. Got: {value}")]
    Time { field: &'static str, value: String },

    #[error("unknown field [{field}]")]
    Unknown { field: String },
}

/// Error returned when a data line cannot be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{file}: expected {expected} values, got {got}")]
    FieldCount {
        file: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{file}: {source}")]
    Tokenize {
        file: &'static str,
        source: TokenizeError,
    },

    #[error("{file}: {source}")]
    Field {
        file: &'static str,
        source: FieldError,
    },
}

/// Error returned when parsing an invalid service-day time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{value}': {reason}")]
pub struct TimeError {
    value: String,
    reason: &'static str,
}

impl TimeError {
    pub(crate) fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}
