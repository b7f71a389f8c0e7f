//! Error types for the diff crate.

use docdelta_path::PathError;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A directive path could not be applied to the target document.
    #[error("cannot apply directive: {0}")]
    Path(#[from] PathError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
