//! Sort engine
//!
//! [`derive_sort_state`] is the header-click state machine,
//! [`SortController`] seeds and holds the state, and [`sort_rows`] orders a
//! row tree.

mod rows;
mod state;

pub use rows::*;
pub use state::*;
