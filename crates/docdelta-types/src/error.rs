use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("config error: {0}")]
    Config(String),
}
