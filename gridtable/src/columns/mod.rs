//! Column model
//!
//! Wraps each [`Column`](crate::model::Column) with visibility and expansion
//! flags, resolves expandable columns (static lists or async loaders) and
//! computes the flattened list of columns to render.

mod manager;
mod state;

pub use manager::*;
pub use state::*;
