//! Error types
//!
//! `GridError` covers programmer errors and collaborator failures that the
//! caller must see. `StorageError` never leaves the persistence adapters; it
//! is logged and treated as "no persisted value".

use thiserror::Error;

use crate::model::RowKey;

/// Errors returned by grid operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// A row key was requested that the row model has never seen (or deleted).
    #[error("No RowState for {0}")]
    MissingRowState(RowKey),

    /// A column id was requested that the column model does not track.
    #[error("No ColumnState for {0}")]
    MissingColumnState(String),

    /// A non-header cell resolved to a render-only value under client-side sorting.
    #[error("Column {column} has an unsortable cell for row {row}")]
    UnsortableCell {
        /// Id of the column being sorted.
        column: String,
        /// Row whose cell could not produce a sort value.
        row: RowKey,
    },

    /// `scroll_to` was called without an active virtualizer.
    #[error("scroll_to is only supported for virtualized tables")]
    NotVirtualized,

    /// `scroll_to` targeted a row that is not in the rendered list.
    #[error("Row {0} is not in the rendered list")]
    RowNotInList(RowKey),

    /// A column width string was not `px`, `%` or `fr`.
    #[error("Invalid column width {0:?}: only px, percentage, or fr units are supported")]
    InvalidWidth(String),

    /// An async column loader failed.
    #[error("Column expansion failed: {0}")]
    Expand(#[from] ExpandError),

    /// CSV export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for GridError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The store cannot be used at all (e.g. privacy mode).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Writing would exceed the store's quota.
    #[error("Storage quota exceeded writing {key}")]
    QuotaExceeded {
        /// Key that was being written.
        key: String,
    },

    /// Any other backend failure.
    #[error("Storage error: {0}")]
    Other(String),
}

/// Error returned by an async [`ColumnLoader`](crate::model::ColumnLoader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExpandError {
    /// Error message
    pub message: String,
}

impl ExpandError {
    /// Create a new expansion error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ExpandError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ExpandError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
