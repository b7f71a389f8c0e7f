//! Error types for record-list operations.

use thiserror::Error;

use crate::pivot::KeyConverter;

/// Errors that can occur while grouping, sorting, or reconciling records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// At least one pivot field is required.
    #[error("no pivot fields given")]
    EmptyPivots,

    /// A record lacks one of the pivot fields.
    #[error("record is missing pivot field: {field}")]
    MissingPivot { field: String },

    /// A grouped mapping key could not be converted back into a field value.
    #[error("cannot convert key {key:?} with {converter:?} converter")]
    InvalidKey { key: String, converter: KeyConverter },

    /// A grouped mapping does not have the shape its pivots describe.
    #[error("malformed group at {path}: expected a record or a list of records")]
    MalformedGroup { path: String },

    /// No record satisfies the lookup conditions.
    #[error("no record matches {conditions}")]
    NotFound { conditions: String },

    /// More than one record satisfies the lookup conditions.
    #[error("{count} records match {conditions}, expected exactly one")]
    AmbiguousMatch { count: usize, conditions: String },
}

/// Convenience type alias for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;
