//! Store error types.

use std::path::PathBuf;

use crate::feed::{FeedFile, FieldError, RecordError, SchemaError};

/// Errors surfaced by [`TransitStore`](super::TransitStore) operations.
///
/// Every lower-level failure is normalised into this type before it leaves
/// the store. Malformed data rows are never reported here; they are skipped
/// and counted in an [`ImportReport`](super::ImportReport).
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// The file to import does not exist.
    #[error("{}: file not found", path.display())]
    NotFound { path: PathBuf },

    /// The file name is not one of the four supported feed files.
    #[error("{name}: unsupported file, expected one of routes.txt, stops.txt, trips.txt, stop_times.txt")]
    UnsupportedFile { name: String },

    /// A header line did not match its schema; the whole import is aborted.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A single record could not be built or edited.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Nothing to export for this file.
    #[error("{kind}: there is nothing to export")]
    EmptyTable { kind: FeedFile },

    /// Export target is missing or is not a directory.
    #[error("{}: {reason}", path.display())]
    NotADirectory { path: PathBuf, reason: &'static str },

    /// Reading or writing a file failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// No record with this identifier.
    #[error("{kind}: no record with id {id}")]
    UnknownEntity { kind: FeedFile, id: String },

    /// An edit would make a table key empty or duplicate.
    #[error("{kind}: cannot change id to '{id}': {reason}")]
    KeyConflict {
        kind: FeedFile,
        id: String,
        reason: &'static str,
    },
}

impl TransitError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TransitError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn field(kind: FeedFile, source: FieldError) -> Self {
        TransitError::Record(RecordError::Field {
            file: kind.file_name(),
            source,
        })
    }

    /// Returns true if this error means a requested file or record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TransitError::NotFound { .. } | TransitError::UnknownEntity { .. }
        )
    }

    /// Returns true if this error was caused by the input rather than the
    /// environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TransitError::UnsupportedFile { .. }
                | TransitError::Schema(_)
                | TransitError::Record(_)
                | TransitError::EmptyTable { .. }
                | TransitError::KeyConflict { .. }
        )
    }
}
