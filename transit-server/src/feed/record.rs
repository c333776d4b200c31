//! Shared parse and serialize logic for the four entity kinds.

use super::error::{FieldError, RecordError};
use super::schema::{FieldList, Schema};
use super::tokenizer::{join_record, split_record};

/// A typed entity read from one line of a feed file.
///
/// Implementors describe how to assign one field from its text and how to
/// write one field back out; [`Record::parse`] and [`Record::to_line`] drive
/// those per field, following the file's [`FieldList`].
pub trait Record: Sized {
    /// Schema of the file this entity is read from.
    const SCHEMA: &'static Schema;

    /// A record with every field at its default, before any field is read.
    fn blank() -> Self;

    /// Coerce `value` and store it as `field`.
    fn assign(&mut self, field: &str, value: &str) -> Result<(), FieldError>;

    /// The text written to a feed file for `field`.
    fn field_text(&self, field: &str) -> String;

    /// Check fields that must be set whether or not the line named them.
    fn check_required(&self) -> Result<(), FieldError> {
        Ok(())
    }

    /// Extra checks applied when a field is edited rather than imported.
    fn check_update(_field: &str, _value: &str) -> Result<(), FieldError> {
        Ok(())
    }

    /// Replace one field with newly entered text.
    ///
    /// The text is coerced exactly as on import, after [`Record::check_update`].
    /// On failure the record is left unchanged.
    fn update_field(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        Self::check_update(field, value)?;
        self.assign(field, value)
    }

    /// Build a record from a raw line laid out as `fields`.
    ///
    /// The line must have exactly one value per field; each value is coerced
    /// according to its field, and the first failure is returned.
    fn parse(fields: &FieldList, line: &str) -> Result<Self, RecordError> {
        let file = Self::SCHEMA.file;
        let values =
            split_record(line).map_err(|source| RecordError::Tokenize { file, source })?;
        if values.len() != fields.len() {
            return Err(RecordError::FieldCount {
                file,
                expected: fields.len(),
                got: values.len(),
            });
        }

        let mut record = Self::blank();
        for (field, value) in fields.iter().zip(&values) {
            record
                .assign(field, value)
                .map_err(|source| RecordError::Field { file, source })?;
        }
        record
            .check_required()
            .map_err(|source| RecordError::Field { file, source })?;

        Ok(record)
    }

    /// Returns true if `line` would parse as a record laid out as `fields`.
    fn is_valid_line(fields: &FieldList, line: &str) -> bool {
        Self::parse(fields, line).is_ok()
    }

    /// Write this record as one line holding exactly `fields`, in order.
    fn to_line(&self, fields: &FieldList) -> String {
        join_record(fields.iter().map(|field| self.field_text(field)))
    }
}

/// Entities stored in a table keyed by identifier.
pub trait Keyed {
    /// The unique identifier of this entity.
    fn key(&self) -> &str;
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required { field });
    }
    Ok(value.to_string())
}

pub(crate) fn integer<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, FieldError> {
    value.parse().map_err(|_| FieldError::Integer {
        field,
        value: value.to_string(),
    })
}

/// Like [`integer`], but an empty value yields `T::default()`.
pub(crate) fn integer_or_default<T: std::str::FromStr + Default>(
    field: &'static str,
    value: &str,
) -> Result<T, FieldError> {
    if value.is_empty() {
        return Ok(T::default());
    }
    integer(field, value)
}

pub(crate) fn number(field: &'static str, value: &str) -> Result<f64, FieldError> {
    value.parse().map_err(|_| FieldError::Number {
        field,
        value: value.to_string(),
    })
}
