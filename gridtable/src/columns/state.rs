//! Per-column UI state.

use crate::model::Column;

/// Where a column is in its expansion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionState {
    Collapsed,
    /// Expanded, waiting on an async loader.
    Expanding,
    Expanded,
}

/// Visibility and expansion of one column.
///
/// Snapshots of this type are returned by
/// [`ColumnStates::get`](super::ColumnStates::get); the live value is owned
/// by the manager.
#[derive(Debug)]
pub struct ColumnState<D> {
    /// Latest definition supplied for this id.
    pub column: Column<D>,
    pub visible: bool,
    pub expanded: bool,
    /// Ids of the child columns, once resolved.
    pub children: Option<Vec<String>>,
    /// An async loader is queued or in flight.
    pub loading: bool,
}

impl<D> ColumnState<D> {
    pub(crate) fn new(column: Column<D>, visible: bool, expanded: bool) -> Self {
        Self {
            column,
            visible,
            expanded,
            children: None,
            loading: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.column.id
    }

    pub fn expansion(&self) -> ExpansionState {
        if !self.expanded {
            ExpansionState::Collapsed
        } else if self.loading {
            ExpansionState::Expanding
        } else {
            ExpansionState::Expanded
        }
    }
}

impl<D> Clone for ColumnState<D> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            visible: self.visible,
            expanded: self.expanded,
            children: self.children.clone(),
            loading: self.loading,
        }
    }
}
