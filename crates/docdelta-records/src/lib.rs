//! Record-list tools for docdelta.
//!
//! Works on collections of flat records (one [`Document`](docdelta_types::Document)
//! per record) identified by one or more pivot fields.
//!
//! # Key Types
//!
//! - [`group_by_pivots`] / [`ungroup`] -- pivot a record list into a nested mapping and back
//! - [`KeyConverter`] -- how a pivot value becomes a mapping key, and back
//! - [`reconcile`] / [`Reconciliation`] -- three-way deleted/changed/created classification
//! - [`compare_values`] -- total order over JSON values used for pivot sorting
//! - [`find_unique`] / [`index_by`] -- record lookup helpers

pub mod error;
pub mod lookup;
pub mod order;
pub mod pivot;
pub mod reconcile;

pub use error::{RecordError, Result};
pub use lookup::{find_unique, index_by};
pub use order::{compare_pivots, compare_values, sort_by_pivots};
pub use pivot::{group_by_pivots, ungroup, KeyConverter};
pub use reconcile::{reconcile, ChangedRecord, Reconciliation};
