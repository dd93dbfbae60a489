//! Best-effort persistence of UI state
//!
//! Every adapter here wraps a [`KeyValueStore`] and swallows its failures:
//! a store that errors, or holds a value that no longer parses, behaves as if
//! nothing had been persisted. Values are JSON.

mod columns;
mod memory;
mod resizing;
mod rows;
mod scroll;

pub use columns::*;
pub use memory::*;
pub use resizing::*;
pub use rows::*;
pub use scroll::*;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Synchronous string key-value store (e.g. a browser's session storage).
///
/// Implementations may fail on any call; callers in this crate log and
/// ignore those failures.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and parse a JSON value, treating every failure as absent.
pub(crate) fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring unparseable value at {}: {}", key, e);
            None
        }
    }
}

/// Serialize and write a JSON value, logging failures.
pub(crate) fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Failed to serialize {}: {}", key, e);
            return;
        }
    };
    match store.set_item(key, &raw) {
        Ok(()) => log::trace!("Persisted {} ({} bytes)", key, raw.len()),
        Err(e) => log::warn!("Failed to write {}: {}", key, e),
    }
}
