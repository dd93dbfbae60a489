//! Persisted scroll position

use std::sync::Arc;

use super::{KeyValueStore, read_json, write_json};

/// Saves the first rendered row index per page path and table.
///
/// Purely imperative: nothing is saved unless [`ScrollStorage::save`] is called.
#[derive(Clone)]
pub struct ScrollStorage {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ScrollStorage {
    pub fn new(store: Arc<dyn KeyValueStore>, path: &str, table_id: &str) -> Self {
        Self {
            store,
            key: format!("scroll_{path}_{table_id}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> Option<usize> {
        read_json(&*self.store, &self.key)
    }

    pub fn save(&self, start_index: usize) {
        write_json(&*self.store, &self.key, &start_index);
    }
}

impl std::fmt::Debug for ScrollStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
