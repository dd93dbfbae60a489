//! Persisted collapsed rows

use std::collections::HashSet;
use std::sync::Arc;

use super::{KeyValueStore, read_json, write_json};
use crate::observe::{RowChange, SubscriptionId};
use crate::rows::RowStates;

/// Remembers which parent rows were collapsed.
///
/// Like [`ColumnStorage`](super::ColumnStorage) the loaded ids seed newly
/// created rows until [`RowStorage::done`]. Unlike it, saving is reactive:
/// once attached to a [`RowStates`], every collapse change is written back.
#[derive(Clone)]
pub struct RowStorage {
    store: Arc<dyn KeyValueStore>,
    key: String,
    collapsed: Option<HashSet<String>>,
    done: bool,
}

impl RowStorage {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: format!("collapsedRows_{key}"),
            collapsed: None,
            done: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted ids.
    pub fn load(&mut self) {
        self.collapsed =
            read_json::<Vec<String>>(&*self.store, &self.key).map(|ids| ids.into_iter().collect());
        log::debug!(
            "Loaded {} collapsed rows from {}",
            self.collapsed.as_ref().map_or(0, HashSet::len),
            self.key
        );
    }

    /// Whether row `id` was collapsed, until hydration is done.
    pub fn was_collapsed(&self, id: &str) -> Option<bool> {
        if self.done {
            return None;
        }
        self.collapsed.as_ref().map(|ids| ids.contains(id))
    }

    pub fn done(&mut self) {
        self.done = true;
    }

    pub fn save(&self, collapsed: &[String]) {
        write_json(&*self.store, &self.key, collapsed);
    }

    /// Write the collapsed set every time `rows` reports a collapse change.
    pub fn attach<D>(&self, rows: &RowStates<D>) -> SubscriptionId {
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        rows.subscribe(move |change| {
            if let RowChange::Collapse { collapsed } = change {
                write_json(&*store, &key, collapsed);
            }
        })
    }
}

impl std::fmt::Debug for RowStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStorage")
            .field("key", &self.key)
            .field("collapsed", &self.collapsed)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
