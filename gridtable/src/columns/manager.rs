//! Column state manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use sha2::{Digest, Sha256};

use crate::error::{ExpandError, GridError};
use crate::model::{Column, ColumnLoader, ExpandColumns, ExportTarget};
use crate::observe::{ColumnChange, Observers, Revision, SubscriptionId};
use crate::storage::{ColumnStorage, KeyValueStore};

use super::state::{ColumnState, ExpansionState};

/// Storage key derived from a column list when the caller supplies none.
///
/// The first 16 hex characters of the SHA-256 of the comma-joined top-level
/// ids. Hidden columns are included on purpose, so hiding or showing a
/// column does not move its persisted flags to a different key.
pub fn default_storage_key<D>(columns: &[Column<D>]) -> String {
    let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
    let mut hasher = Sha256::new();
    hasher.update(ids.join(",").as_bytes());
    let hash = hasher.finalize();
    hash.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

type Loader<D> = Arc<dyn ColumnLoader<D>>;

fn loader_of<D>(column: &Column<D>) -> Option<Loader<D>> {
    match &column.expand_columns {
        Some(ExpandColumns::Loader(loader)) => Some(Arc::clone(loader)),
        _ => None,
    }
}

// =============================================================================
// Inner
// =============================================================================

struct ColumnsInner<D> {
    map: HashMap<String, ColumnState<D>>,
    /// Top-level ids in declaration order.
    top: Vec<String>,
    /// Columns whose loader must run on the next `run_pending_expansions`.
    pending: Vec<String>,
    storage: Option<ColumnStorage>,
}

impl<D> ColumnsInner<D> {
    fn new(storage: Option<ColumnStorage>) -> Self {
        Self {
            map: HashMap::new(),
            top: Vec::new(),
            pending: Vec::new(),
            storage,
        }
    }

    fn add_column(&mut self, column: Column<D>) {
        let id = column.id.clone();

        if let Some(state) = self.map.get_mut(&id) {
            let old_loader = loader_of(&state.column);
            state.column = column;
            if !state.expanded {
                return;
            }
            let static_children = match &state.column.expand_columns {
                Some(ExpandColumns::Columns(cols)) => Some(cols.clone()),
                _ => None,
            };
            if let Some(cols) = static_children {
                self.apply_children(&id, cols);
                return;
            }
            if let Some(new) = loader_of(&state.column) {
                let changed = old_loader.is_none_or(|old| !Arc::ptr_eq(&old, &new));
                if changed {
                    log::debug!("Loader for column {} changed, re-fetching", id);
                    self.queue_load(&id);
                }
            }
            return;
        }

        let default_visible = !(column.can_hide && !column.init_visible);
        let (visible, expanded) = match &self.storage {
            Some(storage) => (
                storage.was_visible(&id).unwrap_or(default_visible),
                storage.was_expanded(&id).unwrap_or(column.init_expanded),
            ),
            None => (default_visible, column.init_expanded),
        };
        log::trace!(
            "New column state {} (visible={}, expanded={})",
            id,
            visible,
            expanded
        );
        self.map
            .insert(id.clone(), ColumnState::new(column, visible, expanded));
        if visible && expanded {
            self.begin_expand(&id);
        }
    }

    /// Expand `id` from a synchronous path. Static children apply now, loaders queue.
    fn begin_expand(&mut self, id: &str) {
        let Some(state) = self.map.get_mut(id) else {
            return;
        };
        state.expanded = true;
        if state.children.is_some() || state.loading {
            return;
        }
        match &state.column.expand_columns {
            None => state.children = Some(Vec::new()),
            Some(ExpandColumns::Columns(cols)) => {
                let cols = cols.clone();
                self.apply_children(id, cols);
            }
            Some(ExpandColumns::Loader(_)) => self.queue_load(id),
        }
    }

    fn queue_load(&mut self, id: &str) {
        if let Some(state) = self.map.get_mut(id) {
            state.loading = true;
        }
        if !self.pending.iter().any(|p| p == id) {
            self.pending.push(id.to_string());
        }
    }

    fn apply_children(&mut self, id: &str, children: Vec<Column<D>>) {
        let ids: Vec<String> = children.iter().map(|c| c.id.clone()).collect();
        for child in children {
            self.add_column(child);
        }
        if let Some(state) = self.map.get_mut(id) {
            state.children = Some(ids);
            state.loading = false;
        }
    }

    /// Ids in pre-order, descending into resolved children.
    fn preorder(&self) -> Vec<&ColumnState<D>> {
        let mut out = Vec::with_capacity(self.map.len());
        self.walk(&self.top, &mut out);
        out
    }

    fn walk<'a>(&'a self, ids: &[String], out: &mut Vec<&'a ColumnState<D>>) {
        for id in ids {
            if let Some(state) = self.map.get(id) {
                out.push(state);
                if let Some(children) = &state.children {
                    self.walk(children, out);
                }
            }
        }
    }

    fn visible_ids(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .filter(|s| s.visible)
            .map(|s| s.column.id.clone())
            .collect()
    }

    fn expanded_ids(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .filter(|s| s.expanded)
            .map(|s| s.column.id.clone())
            .collect()
    }

    fn flatten_visible(&self, ids: &[String], target: ExportTarget, out: &mut Vec<Column<D>>) {
        for id in ids {
            let Some(state) = self.map.get(id) else {
                continue;
            };
            if !state.visible || (target == ExportTarget::Csv && state.column.is_action) {
                continue;
            }
            if !state.expanded {
                out.push(state.column.clone());
                continue;
            }
            if !state.column.hide_on_expand {
                out.push(state.column.clone());
            }
            if let Some(children) = &state.children {
                self.flatten_visible(children, target, out);
            }
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(state) = self.map.remove(id) else {
            return false;
        };
        for child in state.children.into_iter().flatten() {
            self.remove(&child);
        }
        self.top.retain(|t| t != id);
        self.pending.retain(|p| p != id);
        true
    }

    fn save_visible(&self) {
        if let Some(storage) = &self.storage {
            storage.save_visible(&self.visible_ids());
        }
    }

    fn save_expanded(&self) {
        if let Some(storage) = &self.storage {
            storage.save_expanded(&self.expanded_ids());
        }
    }
}

// =============================================================================
// ColumnStates
// =============================================================================

/// Tracks visibility and expansion for every column id ever supplied.
///
/// `ColumnStates` is a cheap-to-clone handle. States are created the first
/// time an id is seen and re-associated with the new definition when the id
/// reappears, so user-driven flags survive definition refreshes. States are
/// only dropped through [`ColumnStates::remove`].
///
/// # Example
///
/// ```
/// use gridtable::columns::ColumnStates;
/// use gridtable::model::{Column, ExportTarget};
///
/// let states: ColumnStates<()> = ColumnStates::new();
/// states.set_columns(
///     vec![Column::new("name"), Column::new("notes").hideable(false)],
///     None,
/// );
///
/// let ids: Vec<String> = states
///     .all_visible_columns(ExportTarget::Web)
///     .into_iter()
///     .map(|c| c.id)
///     .collect();
/// assert_eq!(ids, ["name"]);
/// ```
pub struct ColumnStates<D> {
    inner: Arc<RwLock<ColumnsInner<D>>>,
    dirty: Arc<AtomicBool>,
    observers: Arc<Observers<ColumnChange>>,
    revision: Revision,
}

impl<D> Clone for ColumnStates<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
            observers: Arc::clone(&self.observers),
            revision: self.revision.clone(),
        }
    }
}

impl<D> Default for ColumnStates<D> {
    fn default() -> Self {
        Self::from_storage(None)
    }
}

impl<D> std::fmt::Debug for ColumnStates<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (len, pending) = self
            .inner
            .read()
            .map(|g| (g.map.len(), g.pending.len()))
            .unwrap_or_default();
        f.debug_struct("ColumnStates")
            .field("len", &len)
            .field("pending", &pending)
            .field("revision", &self.revision.get())
            .finish()
    }
}

impl<D> ColumnStates<D> {
    /// Create a manager that persists nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager that persists visibility and expansion to `store`.
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::from_storage(Some(ColumnStorage::new(store)))
    }

    fn from_storage(storage: Option<ColumnStorage>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ColumnsInner::new(storage))),
            dirty: Arc::new(AtomicBool::new(false)),
            observers: Arc::new(Observers::new()),
            revision: Revision::default(),
        }
    }

    fn publish(&self, events: Vec<ColumnChange>) {
        if events.is_empty() {
            return;
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.revision.bump();
        for event in &events {
            self.observers.notify(event);
        }
    }

    // -------------------------------------------------------------------------
    // Synchronization
    // -------------------------------------------------------------------------

    /// Re-synchronize against a new column list.
    ///
    /// When any column can be hidden and no `storage_key` is supplied, a key
    /// is derived from the column ids. Persisted flags are loaded before the
    /// first pass and ignored once a non-empty list has been applied.
    pub fn set_columns(&self, columns: Vec<Column<D>>, storage_key: Option<&str>) {
        {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            let inner = &mut *guard;

            if let Some(storage) = inner.storage.as_mut() {
                let key = storage_key.map(str::to_string).or_else(|| {
                    columns
                        .iter()
                        .any(|c| c.can_hide)
                        .then(|| default_storage_key(&columns))
                });
                if let Some(key) = key {
                    storage.load(&key);
                }
            }

            let non_empty = !columns.is_empty();
            inner.top = columns.iter().map(|c| c.id.clone()).collect();
            for column in columns {
                inner.add_column(column);
            }
            if non_empty && let Some(storage) = inner.storage.as_mut() {
                storage.done();
            }
            log::debug!(
                "set_columns: {} top-level, {} tracked, {} pending loads",
                inner.top.len(),
                inner.map.len(),
                inner.pending.len()
            );
        }
        self.publish(vec![ColumnChange::Columns]);
    }

    /// Insert or update a single column, preserving its flags.
    ///
    /// An already-expanded column re-applies a static child list, and
    /// re-fetches when its loader was replaced.
    pub fn add_column(&self, column: Column<D>) {
        {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            if !guard.map.contains_key(&column.id) && !guard.top.contains(&column.id) {
                guard.top.push(column.id.clone());
            }
            guard.add_column(column);
        }
        self.publish(vec![ColumnChange::Columns]);
    }

    /// Drop a column (and its resolved children).
    pub fn remove(&self, id: &str) -> bool {
        let removed = self
            .inner
            .write()
            .map(|mut g| g.remove(id))
            .unwrap_or(false);
        if removed {
            self.publish(vec![ColumnChange::Columns]);
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Snapshot of one column's state.
    pub fn get(&self, id: &str) -> Result<ColumnState<D>, GridError> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.map.get(id).cloned())
            .ok_or_else(|| GridError::MissingColumnState(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .read()
            .map(|g| g.map.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.read_state(id, |s| s.visible)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.read_state(id, |s| s.expanded)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.read_state(id, |s| s.loading)
    }

    pub fn expansion_state(&self, id: &str) -> Option<ExpansionState> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.map.get(id).map(ColumnState::expansion))
    }

    pub fn children_ids(&self, id: &str) -> Option<Vec<String>> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.map.get(id).and_then(|s| s.children.clone()))
    }

    fn read_state(&self, id: &str, f: impl Fn(&ColumnState<D>) -> bool) -> bool {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.map.get(id).map(&f))
            .unwrap_or(false)
    }

    /// Flattened list of columns to render for `target`.
    ///
    /// Pre-order: an expanded column yields itself (unless `hide_on_expand`)
    /// followed by its visible children. CSV output drops action columns.
    pub fn all_visible_columns(&self, target: ExportTarget) -> Vec<Column<D>> {
        let Ok(guard) = self.inner.read() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        guard.flatten_visible(&guard.top, target, &mut out);
        out
    }

    /// Ids of every visible column, in pre-order.
    pub fn visible_column_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.visible_ids())
            .unwrap_or_default()
    }

    /// Ids of every expanded column, in pre-order.
    pub fn expanded_column_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.expanded_ids())
            .unwrap_or_default()
    }

    /// Ids waiting on `run_pending_expansions`.
    pub fn pending_expansions(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.pending.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Visibility and expansion
    // -------------------------------------------------------------------------

    /// Show or hide a column.
    ///
    /// A column becoming visible while flagged expanded with no children
    /// yet is expanded once.
    pub fn set_visible(&self, id: &str, visible: bool) -> Result<(), GridError> {
        let visible_ids = {
            let Ok(mut guard) = self.inner.write() else {
                return Ok(());
            };
            let inner = &mut *guard;
            let state = inner
                .map
                .get_mut(id)
                .ok_or_else(|| GridError::MissingColumnState(id.to_string()))?;
            if state.visible == visible {
                return Ok(());
            }
            state.visible = visible;
            let expand = visible && state.expanded && state.children.is_none();
            if expand {
                inner.begin_expand(id);
            }
            inner.save_visible();
            inner.visible_ids()
        };
        log::debug!("Column {} visible={}", id, visible);
        self.publish(vec![ColumnChange::Visibility {
            visible: visible_ids,
        }]);
        Ok(())
    }

    /// Make exactly `ids` visible among the hideable columns.
    pub fn set_visible_columns(&self, ids: &[String]) {
        let visible_ids = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            let inner = &mut *guard;
            let mut to_expand = Vec::new();
            for (id, state) in inner.map.iter_mut() {
                if !state.column.can_hide {
                    continue;
                }
                let visible = ids.contains(id);
                if state.visible == visible {
                    continue;
                }
                state.visible = visible;
                if visible && state.expanded && state.children.is_none() {
                    to_expand.push(id.clone());
                }
            }
            for id in to_expand {
                inner.begin_expand(&id);
            }
            inner.save_visible();
            inner.visible_ids()
        };
        self.publish(vec![ColumnChange::Visibility {
            visible: visible_ids,
        }]);
    }

    /// Flip a visible column's expansion. Hidden columns are left alone.
    ///
    /// The first expansion resolves children; static lists apply immediately
    /// and loaders are queued for [`ColumnStates::run_pending_expansions`].
    pub fn toggle_expanded(&self, id: &str) -> Result<(), GridError> {
        let expanded_ids = {
            let Ok(mut guard) = self.inner.write() else {
                return Ok(());
            };
            let inner = &mut *guard;
            let state = inner
                .map
                .get_mut(id)
                .ok_or_else(|| GridError::MissingColumnState(id.to_string()))?;
            if !state.visible {
                return Ok(());
            }
            if state.expanded {
                state.expanded = false;
            } else {
                inner.begin_expand(id);
            }
            inner.save_expanded();
            inner.expanded_ids()
        };
        log::debug!("Toggled expansion of column {}", id);
        self.publish(vec![ColumnChange::Expansion {
            expanded: expanded_ids,
        }]);
        Ok(())
    }

    /// Resolve a column's children.
    ///
    /// Idempotent unless `force`: a column with resolved children, or with
    /// a load in flight, is left alone. A load still queued for
    /// [`ColumnStates::run_pending_expansions`] is taken over and awaited
    /// here. Loader failures are returned; the `expanded` flag is not rolled
    /// back.
    pub async fn do_expand(&self, id: &str, force: bool) -> Result<(), GridError> {
        let loader = {
            let Ok(mut guard) = self.inner.write() else {
                return Ok(());
            };
            let inner = &mut *guard;
            let queued = inner.pending.iter().any(|p| p == id);
            let state = inner
                .map
                .get_mut(id)
                .ok_or_else(|| GridError::MissingColumnState(id.to_string()))?;
            if !force && !queued && (state.loading || state.children.is_some()) {
                return Ok(());
            }
            state.expanded = true;
            let loader = match &state.column.expand_columns {
                None => {
                    state.children.get_or_insert_with(Vec::new);
                    state.loading = false;
                    None
                }
                Some(ExpandColumns::Columns(cols)) => {
                    let cols = cols.clone();
                    inner.apply_children(id, cols);
                    None
                }
                Some(ExpandColumns::Loader(loader)) => {
                    state.loading = true;
                    Some(Arc::clone(loader))
                }
            };
            inner.pending.retain(|p| p != id);
            inner.save_expanded();
            loader
        };

        let Some(loader) = loader else {
            self.publish(vec![
                ColumnChange::Expansion {
                    expanded: self.expanded_column_ids(),
                },
                ColumnChange::ChildrenLoaded { id: id.to_string() },
            ]);
            return Ok(());
        };

        self.publish(vec![ColumnChange::Expansion {
            expanded: self.expanded_column_ids(),
        }]);
        log::debug!("Loading children of column {}", id);
        let result = loader.load().await;
        self.apply_loaded(id, result)
    }

    /// Run every queued loader, including ones queued by the children they produce.
    ///
    /// All loaders run even if one fails; the first failure is returned.
    pub async fn run_pending_expansions(&self) -> Result<(), GridError> {
        let mut first_error = None;
        loop {
            let batch: Vec<(String, Loader<D>)> = {
                let Ok(mut guard) = self.inner.write() else {
                    break;
                };
                let inner = &mut *guard;
                let pending = std::mem::take(&mut inner.pending);
                pending
                    .into_iter()
                    .filter_map(|id| {
                        let loader = inner.map.get(&id).and_then(|s| loader_of(&s.column));
                        if loader.is_none()
                            && let Some(state) = inner.map.get_mut(&id)
                        {
                            state.loading = false;
                        }
                        loader.map(|l| (id, l))
                    })
                    .collect()
            };
            if batch.is_empty() {
                break;
            }

            log::debug!("Running {} pending column loads", batch.len());
            let results = join_all(batch.into_iter().map(|(id, loader)| async move {
                let result = loader.load().await;
                (id, result)
            }))
            .await;

            for (id, result) in results {
                if let Err(e) = self.apply_loaded(&id, result)
                    && first_error.is_none()
                {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn apply_loaded(
        &self,
        id: &str,
        result: Result<Vec<Column<D>>, ExpandError>,
    ) -> Result<(), GridError> {
        match result {
            Ok(children) => {
                let applied = self
                    .inner
                    .write()
                    .map(|mut g| {
                        if g.map.contains_key(id) {
                            g.apply_children(id, children);
                            g.save_visible();
                            true
                        } else {
                            false
                        }
                    })
                    .unwrap_or(false);
                if applied {
                    log::debug!("Column {} children loaded", id);
                    self.publish(vec![
                        ColumnChange::Columns,
                        ColumnChange::ChildrenLoaded { id: id.to_string() },
                    ]);
                } else {
                    log::debug!("Column {} was removed before its children loaded", id);
                }
                Ok(())
            }
            Err(e) => {
                if let Ok(mut guard) = self.inner.write()
                    && let Some(state) = guard.map.get_mut(id)
                {
                    state.loading = false;
                }
                log::warn!("Failed to load children of column {}: {}", id, e);
                self.publish(vec![ColumnChange::Columns]);
                Err(GridError::Expand(e))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Change tracking
    // -------------------------------------------------------------------------

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ColumnChange) + Send + Sync + 'static,
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
