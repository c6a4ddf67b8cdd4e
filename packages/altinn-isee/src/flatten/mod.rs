//! Flattening of nested form data into named fields.
//!
//! Repeated sibling elements ("tables") get ordinal suffixes. Tables nested
//! inside tables are reported as warnings instead of being flattened.

mod engine;
mod types;

pub use engine::FlattenEngine;
pub use types::{FlatField, Flattened};
