//! Error types for path addressing.

use thiserror::Error;

/// Errors that can occur while walking a document by key path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path operations need at least one key.
    #[error("key path is empty")]
    EmptyPath,

    /// A segment of the path is absent from the document.
    #[error("key not found: {path}")]
    KeyNotFound { path: String },

    /// An intermediate value is not a mapping but more keys remain.
    #[error("value at {path} is not a mapping")]
    TypeMismatch { path: String },
}

/// Convenience type alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;
