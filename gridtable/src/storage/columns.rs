//! Persisted column visibility and expansion

use std::collections::HashSet;
use std::sync::Arc;

use super::{KeyValueStore, read_json, write_json};

/// Remembers which columns were visible and expanded.
///
/// Loaded values are only consulted while columns are first being
/// hydrated; after [`ColumnStorage::done`] the live state always wins.
#[derive(Clone)]
pub struct ColumnStorage {
    store: Arc<dyn KeyValueStore>,
    key: Option<String>,
    visible: Option<HashSet<String>>,
    expanded: Option<HashSet<String>>,
    done: bool,
}

impl std::fmt::Debug for ColumnStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnStorage")
            .field("key", &self.key)
            .field("visible", &self.visible)
            .field("expanded", &self.expanded)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ColumnStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: None,
            visible: None,
            expanded: None,
            done: false,
        }
    }

    pub fn visible_key(key: &str) -> String {
        format!("visibleColumns_{key}")
    }

    pub fn expanded_key(key: &str) -> String {
        format!("expandedColumns_{key}")
    }

    /// Storage key in use, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Load persisted ids for `key`. Loading the same key again is a no-op.
    pub fn load(&mut self, key: &str) {
        if self.key.as_deref() == Some(key) {
            return;
        }
        self.key = Some(key.to_string());
        self.visible = read_json::<Vec<String>>(&*self.store, &Self::visible_key(key))
            .map(|ids| ids.into_iter().collect());
        self.expanded = read_json::<Vec<String>>(&*self.store, &Self::expanded_key(key))
            .map(|ids| ids.into_iter().collect());
        log::debug!(
            "Loaded column storage {}: {} visible, {} expanded",
            key,
            self.visible.as_ref().map_or(0, HashSet::len),
            self.expanded.as_ref().map_or(0, HashSet::len),
        );
    }

    /// Whether `id` was visible, if anything was persisted and hydration is not done.
    pub fn was_visible(&self, id: &str) -> Option<bool> {
        if self.done {
            return None;
        }
        self.visible.as_ref().map(|ids| ids.contains(id))
    }

    /// Whether `id` was expanded, if anything was persisted and hydration is not done.
    pub fn was_expanded(&self, id: &str) -> Option<bool> {
        if self.done {
            return None;
        }
        self.expanded.as_ref().map(|ids| ids.contains(id))
    }

    /// Stop consulting the loaded values.
    pub fn done(&mut self) {
        self.done = true;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn save_visible(&self, ids: &[String]) {
        if let Some(key) = &self.key {
            write_json(&*self.store, &Self::visible_key(key), ids);
        }
    }

    pub fn save_expanded(&self, ids: &[String]) {
        if let Some(key) = &self.key {
            write_json(&*self.store, &Self::expanded_key(key), ids);
        }
    }
}
