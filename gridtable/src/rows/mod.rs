//! Row model
//!
//! Mirrors the caller's row tree in an arena of [`RowState`]s carrying
//! selection, filter-match, collapse and removal flags.

mod manager;
mod state;

pub use manager::*;
pub use state::*;
