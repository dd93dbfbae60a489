//! Headless data-grid engine
//!
//! Turns a declarative tree of rows and a list of column definitions into a
//! flattened, sorted, filtered render list, while tracking selection,
//! visibility and persisted UI state across repeated updates.

pub mod columns;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod filter;
pub mod lookup;
pub mod model;
pub mod observe;
pub mod rows;
pub mod sizing;
pub mod sort;
pub mod storage;

mod table;

pub use table::*;

pub mod prelude {
    pub use crate::columns::{ColumnState, ColumnStates, ExpansionState};
    pub use crate::config::GridTableConfig;
    pub use crate::error::{ExpandError, GridError, StorageError};
    pub use crate::lookup::{GridRowLookup, NextPrev, ScrollBehavior, Virtualizer};
    pub use crate::model::{
        CellValue, Column, ColumnPin, ColumnWidth, ExpandColumns, ExportTarget, GridCell,
        GridCellContent, Pin, Row, RowKey,
    };
    pub use crate::rows::{RowState, RowStates, SelectedState};
    pub use crate::sizing::{ColumnSize, ColumnSizing};
    pub use crate::sort::{Direction, InitialSort, SortConfig, SortController, SortState};
    pub use crate::storage::{KeyValueStore, MemoryStore};
    pub use crate::table::{GridTable, RenderedRow};
}
