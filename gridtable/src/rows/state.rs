//! Per-row UI state.

use crate::model::{Row, RowKey};

/// Index of a [`RowState`] in the row arena. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowStateId(pub(crate) usize);

impl RowStateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tri-state checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedState {
    Checked,
    Unchecked,
    Partial,
}

impl SelectedState {
    /// Combine the states of a set of siblings.
    pub fn combine(states: impl IntoIterator<Item = SelectedState>) -> SelectedState {
        let mut any = false;
        let mut all_checked = true;
        let mut all_unchecked = true;
        for state in states {
            any = true;
            all_checked &= state == SelectedState::Checked;
            all_unchecked &= state == SelectedState::Unchecked;
        }
        if !any || all_unchecked {
            SelectedState::Unchecked
        } else if all_checked {
            SelectedState::Checked
        } else {
            SelectedState::Partial
        }
    }
}

/// Selection, filter and removal flags for one row node.
#[derive(Debug, Clone)]
pub struct RowState<D> {
    pub id: RowStateId,
    pub key: RowKey,
    /// Latest row value, without its children.
    pub row: Row<D>,
    pub parent: Option<RowStateId>,
    /// Child ids in the latest input order. `None` for leaves.
    pub children: Option<Vec<RowStateId>>,
    /// Directly selected.
    pub selected: bool,
    pub collapsed: bool,
    /// Passes the current filter.
    pub is_matched: bool,
    /// Seen before but missing from the latest `set_rows`.
    pub was_removed: bool,
}

impl<D> RowState<D> {
    pub(crate) fn new(id: RowStateId, row: Row<D>, collapsed: bool) -> Self {
        Self {
            id,
            key: RowKey::new(row.kind.clone(), row.id.clone()),
            row,
            parent: None,
            children: None,
            selected: false,
            collapsed,
            is_matched: true,
            was_removed: false,
        }
    }

    /// A selected row the filter or the data would hide, which must still render.
    pub fn is_kept(&self) -> bool {
        self.row.is_selectable()
            && !self.row.is_reserved()
            && (self.children.is_none() || !self.row.infers_selected_state())
            && self.selected
            && (!self.is_matched || self.was_removed)
    }

    /// Returns `true` if the row derives its selection from its children.
    pub fn infers_from_children(&self) -> bool {
        self.children.is_some() && self.row.infers_selected_state()
    }
}
