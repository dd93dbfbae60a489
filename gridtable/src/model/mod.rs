//! Caller-supplied value types: rows, cells and column definitions.

mod cell;
mod column;
mod row;

pub use cell::*;
pub use column::*;
pub use row::*;
