//! Row state manager.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::GridError;
use crate::model::{Row, RowKey};
use crate::observe::{Observers, Revision, RowChange, SubscriptionId};
use crate::storage::{KeyValueStore, RowStorage};

use super::state::{RowState, RowStateId, SelectedState};

// =============================================================================
// Inner
// =============================================================================

struct RowsInner<D> {
    /// Arena. Deleted rows leave a `None` so ids stay stable.
    slots: Vec<Option<RowState<D>>>,
    index: HashMap<RowKey, RowStateId>,
    /// Top-level ids in the latest input order.
    top: Vec<RowStateId>,
    storage: Option<RowStorage>,
}

impl<D> RowsInner<D> {
    fn new(storage: Option<RowStorage>) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            top: Vec::new(),
            storage,
        }
    }

    fn state(&self, id: RowStateId) -> Option<&RowState<D>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn state_mut(&mut self, id: RowStateId) -> Option<&mut RowState<D>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn lookup(&self, key: &RowKey) -> Result<RowStateId, GridError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GridError::MissingRowState(key.clone()))
    }

    fn states(&self) -> impl Iterator<Item = &RowState<D>> {
        self.slots.iter().flatten()
    }

    /// Selected directly, or through a chain of inferring ancestors.
    fn inherited(&self, id: RowStateId) -> bool {
        let mut current = self.state(id);
        while let Some(state) = current {
            if state.selected {
                return true;
            }
            current = state
                .parent
                .and_then(|p| self.state(p))
                .filter(|p| p.row.infers_selected_state());
        }
        false
    }

    fn selected_state(&self, id: RowStateId) -> SelectedState {
        let Some(state) = self.state(id) else {
            return SelectedState::Unchecked;
        };
        if self.inherited(id) {
            return SelectedState::Checked;
        }
        if !state.infers_from_children() {
            return SelectedState::Unchecked;
        }
        let children = state.children.iter().flatten().filter_map(|c| self.state(*c));
        SelectedState::combine(
            children
                .filter(|c| c.is_matched && !c.was_removed)
                .filter(|c| c.row.is_selectable() && !c.row.is_reserved())
                .map(|c| self.selected_state(c.id)),
        )
    }

    fn select(&mut self, id: RowStateId, selected: bool) {
        let children = match self.state_mut(id) {
            Some(state) => {
                if state.row.is_selectable() {
                    state.selected = selected;
                }
                state.children.clone().unwrap_or_default()
            }
            None => return,
        };
        for child in children {
            // Kept rows hold an independent, direct selection.
            if self.state(child).is_some_and(RowState::is_kept) {
                continue;
            }
            self.select(child, selected);
        }
    }

    fn clear_inferring_ancestors(&mut self, id: RowStateId) {
        let mut parent = self.state(id).and_then(|s| s.parent);
        while let Some(pid) = parent {
            let Some(state) = self.state_mut(pid) else {
                break;
            };
            if !state.row.infers_selected_state() {
                break;
            }
            state.selected = false;
            parent = state.parent;
        }
    }

    fn detach(&mut self, id: RowStateId) {
        let parent = self.state(id).and_then(|s| s.parent);
        match parent.and_then(|p| self.state_mut(p)) {
            Some(parent) => {
                if let Some(children) = parent.children.as_mut() {
                    children.retain(|c| *c != id);
                }
            }
            None => self.top.retain(|t| *t != id),
        }
    }

    fn remove_subtree(&mut self, id: RowStateId, removed: &mut Vec<RowKey>) {
        let Some(state) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        self.index.remove(&state.key);
        removed.push(state.key);
        for child in state.children.into_iter().flatten() {
            self.remove_subtree(child, removed);
        }
    }

    fn collapsed_ids(&self) -> Vec<String> {
        self.states()
            .filter(|s| s.collapsed && !s.was_removed)
            .map(|s| s.row.id.clone())
            .collect()
    }
}

impl<D: Clone> RowsInner<D> {
    fn sync(
        &mut self,
        row: &Row<D>,
        parent: Option<RowStateId>,
        visited: &mut HashSet<RowStateId>,
    ) -> RowStateId {
        let key = row.key();
        let id = match self.index.get(&key) {
            Some(id) => *id,
            None => {
                let id = RowStateId(self.slots.len());
                let collapsed = self
                    .storage
                    .as_ref()
                    .and_then(|s| s.was_collapsed(&row.id))
                    .unwrap_or(false);
                self.slots
                    .push(Some(RowState::new(id, row.shallow_clone(), collapsed)));
                self.index.insert(key, id);
                id
            }
        };
        visited.insert(id);

        let children: Option<Vec<RowStateId>> = row.children.as_ref().map(|children| {
            children
                .iter()
                .map(|child| self.sync(child, Some(id), visited))
                .collect()
        });

        if let Some(state) = self.state_mut(id) {
            state.row = row.shallow_clone();
            state.parent = parent;
            state.children = children;
            state.was_removed = false;
        }
        id
    }
}

// =============================================================================
// RowStates
// =============================================================================

/// Tracks selection, filter-match and removal flags for every row ever supplied.
///
/// `RowStates` is a cheap-to-clone handle over an arena of [`RowState`]s
/// keyed by [`RowKey`]. Re-supplying the same tree keeps every state (and
/// its [`RowStateId`]); rows that disappear are flagged `was_removed`
/// rather than dropped, so a selected row hidden by new data keeps
/// rendering until it is deselected or explicitly [deleted](Self::delete).
///
/// # Example
///
/// ```
/// use gridtable::model::{Row, RowKey};
/// use gridtable::rows::{RowStates, SelectedState};
///
/// let rows = RowStates::new();
/// rows.set_rows(&[Row::new("parent", "p", ())
///     .with_children(vec![Row::new("child", "a", ()), Row::new("child", "b", ())])]);
///
/// rows.select(&RowKey::new("child", "a"), true).unwrap();
/// assert_eq!(
///     rows.selected_state(&RowKey::new("parent", "p")).unwrap(),
///     SelectedState::Partial
/// );
/// ```
pub struct RowStates<D> {
    inner: Arc<RwLock<RowsInner<D>>>,
    dirty: Arc<AtomicBool>,
    observers: Arc<Observers<RowChange>>,
    revision: Revision,
}

impl<D> Clone for RowStates<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
            observers: Arc::clone(&self.observers),
            revision: self.revision.clone(),
        }
    }
}

impl<D> Default for RowStates<D> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RowsInner::new(None))),
            dirty: Arc::new(AtomicBool::new(false)),
            observers: Arc::new(Observers::new()),
            revision: Revision::default(),
        }
    }
}

impl<D> std::fmt::Debug for RowStates<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (len, top) = self
            .inner
            .read()
            .map(|g| (g.index.len(), g.top.len()))
            .unwrap_or_default();
        f.debug_struct("RowStates")
            .field("len", &len)
            .field("top", &top)
            .field("revision", &self.revision.get())
            .finish()
    }
}

impl<D> RowStates<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager whose collapsed rows are persisted under `key`.
    ///
    /// Persisted ids seed the `collapsed` flag of rows created by the first
    /// `set_rows` carrying data rows; every later collapse change is saved.
    pub fn with_storage(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        let mut storage = RowStorage::new(store, key);
        storage.load();
        let rows = Self::default();
        storage.attach(&rows);
        if let Ok(mut guard) = rows.inner.write() {
            guard.storage = Some(storage);
        }
        rows
    }

    fn publish(&self, event: RowChange) {
        self.dirty.store(true, Ordering::SeqCst);
        self.revision.bump();
        self.observers.notify(&event);
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.inner
            .read()
            .map(|g| g.index.contains_key(key))
            .unwrap_or(false)
    }

    /// Arena id of a row.
    pub fn id_of(&self, key: &RowKey) -> Option<RowStateId> {
        self.inner.read().ok().and_then(|g| g.index.get(key).copied())
    }

    // -------------------------------------------------------------------------
    // Filter boundary
    // -------------------------------------------------------------------------

    /// Mark exactly the rows whose id is in `ids` as matched.
    ///
    /// Reserved rows always match.
    pub fn set_matched_rows(&self, ids: &[String]) {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if let Ok(mut guard) = self.inner.write() {
            for state in guard.slots.iter_mut().flatten() {
                state.is_matched = state.row.is_reserved() || ids.contains(state.row.id.as_str());
            }
        }
        self.publish(RowChange::Matched);
    }

    /// Mark every row as matched.
    pub fn match_all(&self) {
        if let Ok(mut guard) = self.inner.write() {
            for state in guard.slots.iter_mut().flatten() {
                state.is_matched = true;
            }
        }
        self.publish(RowChange::Matched);
    }

    pub fn is_matched(&self, key: &RowKey) -> bool {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.index.get(key).and_then(|id| g.state(*id)).map(|s| s.is_matched))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Select or deselect a row.
    ///
    /// Rows that opted out of selection are left alone. The change cascades
    /// to every descendant that is not kept. Deselecting also clears the
    /// direct flag of each inferring ancestor, up to the first one that
    /// opted out of inference.
    pub fn select(&self, key: &RowKey, selected: bool) -> Result<(), GridError> {
        {
            let Ok(mut guard) = self.inner.write() else {
                return Ok(());
            };
            let id = guard.lookup(key)?;
            if !guard.state(id).is_some_and(|s| s.row.is_selectable()) {
                log::trace!("Ignoring select of unselectable row {}", key);
                return Ok(());
            }
            guard.select(id, selected);
            if !selected {
                guard.clear_inferring_ancestors(id);
            }
        }
        log::debug!("Row {} selected={}", key, selected);
        self.publish(RowChange::Selection);
        Ok(())
    }

    /// Select every matched row, or deselect every row.
    pub fn select_all(&self, selected: bool) {
        if let Ok(mut guard) = self.inner.write() {
            for state in guard.slots.iter_mut().flatten() {
                if !state.row.is_selectable() || state.row.is_reserved() {
                    continue;
                }
                if !selected {
                    state.selected = false;
                } else if state.is_matched && !state.was_removed {
                    state.selected = true;
                }
            }
        }
        self.publish(RowChange::Selection);
    }

    /// Tri-state value for a row's checkbox.
    pub fn selected_state(&self, key: &RowKey) -> Result<SelectedState, GridError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| GridError::MissingRowState(key.clone()))?;
        let id = guard.lookup(key)?;
        Ok(guard.selected_state(id))
    }

    pub fn is_selected(&self, key: &RowKey) -> bool {
        matches!(self.selected_state(key), Ok(SelectedState::Checked))
    }

    /// Tri-state value for the header checkbox.
    ///
    /// Combines every matched top-level data row with every kept row.
    pub fn all_selected_state(&self) -> SelectedState {
        let Ok(guard) = self.inner.read() else {
            return SelectedState::Unchecked;
        };
        let visible = guard
            .top
            .iter()
            .filter_map(|id| guard.state(*id))
            .filter(|s| s.is_matched && s.row.is_selectable() && !s.row.is_reserved())
            .map(|s| guard.selected_state(s.id));
        let kept = guard
            .states()
            .filter(|s| s.is_kept())
            .map(|_| SelectedState::Checked);
        SelectedState::combine(visible.chain(kept))
    }

    pub fn is_kept(&self, key: &RowKey) -> bool {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.index.get(key).and_then(|id| g.state(*id)).map(RowState::is_kept))
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Collapse
    // -------------------------------------------------------------------------

    /// Collapse or expand a parent row.
    ///
    /// The header key toggles every parent row at once: all collapse unless
    /// all were already collapsed.
    pub fn toggle_collapsed(&self, key: &RowKey) -> Result<(), GridError> {
        let collapsed = {
            let Ok(mut guard) = self.inner.write() else {
                return Ok(());
            };
            if *key == RowKey::header() {
                let parents = guard
                    .slots
                    .iter_mut()
                    .flatten()
                    .filter(|s| s.children.is_some() && !s.row.is_reserved() && !s.was_removed);
                let parents: Vec<&mut RowState<D>> = parents.collect();
                let collapse = !parents.iter().all(|s| s.collapsed);
                for state in parents {
                    state.collapsed = collapse;
                }
            } else {
                let id = guard.lookup(key)?;
                if let Some(state) = guard.state_mut(id) {
                    state.collapsed = !state.collapsed;
                }
            }
            guard.collapsed_ids()
        };
        log::debug!("Collapsed rows now {:?}", collapsed);
        self.publish(RowChange::Collapse { collapsed });
        Ok(())
    }

    pub fn is_collapsed(&self, key: &RowKey) -> bool {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.index.get(key).and_then(|id| g.state(*id)).map(|s| s.collapsed))
            .unwrap_or(false)
    }

    /// Ids of collapsed rows, in creation order.
    pub fn collapsed_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.collapsed_ids())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Permanently remove rows and their descendants. Returns the removed keys.
    pub fn delete(&self, keys: &[RowKey]) -> Vec<RowKey> {
        let mut removed = Vec::new();
        if let Ok(mut guard) = self.inner.write() {
            for key in keys {
                let Some(id) = guard.index.get(key).copied() else {
                    continue;
                };
                guard.detach(id);
                guard.remove_subtree(id, &mut removed);
            }
        }
        if !removed.is_empty() {
            log::debug!("Deleted {} row states", removed.len());
            self.publish(RowChange::Deleted(removed.clone()));
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Change tracking
    // -------------------------------------------------------------------------

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RowChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Check if the state has been modified since last check
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    /// Number of changes published so far.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }
}

impl<D: Clone> RowStates<D> {
    /// Re-synchronize against a new row tree.
    ///
    /// Existing states are matched by [`RowKey`] and refreshed; new rows get
    /// new states; states missing from `rows` are flagged `was_removed`.
    pub fn set_rows(&self, rows: &[Row<D>]) {
        {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            let inner = &mut *guard;
            let mut visited = HashSet::new();
            let top: Vec<RowStateId> = rows
                .iter()
                .map(|row| inner.sync(row, None, &mut visited))
                .collect();
            inner.top = top;

            let mut removed = 0;
            for state in inner.slots.iter_mut().flatten() {
                if !visited.contains(&state.id) && !state.was_removed {
                    state.was_removed = true;
                    removed += 1;
                }
            }

            if rows.iter().any(|r| !r.is_reserved())
                && let Some(storage) = inner.storage.as_mut()
            {
                storage.done();
            }
            log::debug!(
                "set_rows: {} visited, {} newly removed, {} tracked",
                visited.len(),
                removed,
                inner.index.len()
            );
        }
        self.publish(RowChange::Rows);
    }

    /// Snapshot of one row's state.
    pub fn get(&self, key: &RowKey) -> Result<RowState<D>, GridError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| GridError::MissingRowState(key.clone()))?;
        let id = guard.lookup(key)?;
        guard
            .state(id)
            .cloned()
            .ok_or_else(|| GridError::MissingRowState(key.clone()))
    }

    /// Rows that must render even though the filter or the data hides them.
    pub fn kept_rows(&self) -> Vec<Row<D>> {
        self.inner
            .read()
            .map(|g| {
                g.states()
                    .filter(|s| s.is_kept())
                    .map(|s| s.row.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every data row whose checkbox is checked, in creation order.
    pub fn selected_rows(&self) -> Vec<Row<D>> {
        self.inner
            .read()
            .map(|g| {
                g.states()
                    .filter(|s| !s.row.is_reserved())
                    .filter(|s| g.selected_state(s.id) == SelectedState::Checked)
                    .map(|s| s.row.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
