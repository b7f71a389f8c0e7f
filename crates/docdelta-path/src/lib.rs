//! Path addressing and mapping combinators for docdelta.
//!
//! - [`path`] -- get / set / has / delete a value inside a nested document
//!   through a [`KeyPath`](docdelta_types::KeyPath).
//! - [`combine`] -- shallow merge and top-level key projection.

pub mod combine;
pub mod error;
pub mod path;

pub use combine::{merge, project};
pub use error::{PathError, Result};
pub use path::{delete, get, get_mut, has, set, set_value};
