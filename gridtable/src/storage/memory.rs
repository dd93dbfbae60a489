//! In-memory key-value store using DashMap

use dashmap::DashMap;

use super::KeyValueStore;
use crate::error::StorageError;

/// A process-local [`KeyValueStore`] backed by a concurrent hash map.
///
/// An optional quota (in bytes, summed over keys and values) makes writes
/// fail the way a full browser storage area does.
///
/// # Example
///
/// ```
/// use gridtable::storage::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new().with_quota(16);
/// assert!(store.set_item("a", "1").is_ok());
/// assert!(store.set_item("b", "a much longer value").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    store: DashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates a new empty store without a quota.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
            quota: None,
        }
    }

    /// Limit the total stored bytes.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Total bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.store
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(key).map(|entry| entry.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let replaced = self
                .store
                .get(key)
                .map(|entry| key.len() + entry.value().len())
                .unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key);
        Ok(())
    }
}
