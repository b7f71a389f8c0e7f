//! Deep diff engine for docdelta.
//!
//! Compares two versions of a nested document and reports the minimal set of
//! field-level changes, either as a categorized tree or as flat dotted-path
//! partial-update directives.
//!
//! # Key Types
//!
//! - [`DiffSummary`] -- `created` / `updated` / `deleted` trees mirroring the input shape
//! - [`UpdateDirective`] -- `$set` / `$unset` maps keyed by dotted path
//! - [`ChangeSet`] / [`Change`] -- one entry per changed path
//!
//! Arrays are leaves: two arrays that differ at all show up as a single
//! replacement, never as an element-wise diff.

pub mod changes;
pub mod deep;
pub mod error;
pub mod update;
mod walk;

pub use changes::{list_changes, Change, ChangeSet};
pub use deep::{diff, diff_default, DiffSummary};
pub use error::{DiffError, DiffResult};
pub use update::{compute_update, compute_update_with, UpdateDirective, UNSET_MARKER};
