//! Foundation types for docdelta.
//!
//! This crate provides the vocabulary shared by every other docdelta crate:
//! how a location inside a nested document is addressed, and which changes a
//! diff should report.
//!
//! # Key Types
//!
//! - [`Document`] -- A nested mapping (`serde_json::Map<String, Value>`)
//! - [`KeyPath`] -- Ordered key sequence locating a node in a document
//! - [`ChangeKind`] -- `created` / `updated` / `deleted`
//! - [`ChangeFilter`] -- Which change kinds to compute and which keys participate

pub mod error;
pub mod filter;
pub mod path;

pub use error::TypeError;
pub use filter::{ChangeFilter, ChangeKind, IDENTITY_KEY};
pub use path::KeyPath;

/// A nested mapping: string keys, JSON values. Interior nodes are
/// `Value::Object`; everything else is a leaf.
pub type Document = serde_json::Map<String, serde_json::Value>;
