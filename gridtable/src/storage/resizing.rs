//! Persisted column widths

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{KeyValueStore, read_json, write_json};
use crate::debounce::Debouncer;

/// Default delay before a resized width map is written.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Widths the user dragged columns to, keyed by column id.
///
/// The in-memory map updates immediately; writes to the store are debounced
/// so a drag gesture produces a single write.
pub struct ColumnResizing {
    store: Arc<dyn KeyValueStore>,
    key: String,
    widths: BTreeMap<String, f64>,
    writer: Debouncer<BTreeMap<String, f64>>,
}

impl ColumnResizing {
    /// Load the persisted widths for `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str, delay: Duration) -> Self {
        let key = format!("columnWidths_{key}");
        let widths = read_json(&*store, &key).unwrap_or_default();
        Self {
            store,
            key,
            widths,
            writer: Debouncer::new(delay),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn widths(&self) -> &BTreeMap<String, f64> {
        &self.widths
    }

    pub fn width(&self, column_id: &str) -> Option<f64> {
        self.widths.get(column_id).copied()
    }

    pub fn set_resized_width(&mut self, column_id: impl Into<String>, width: f64, now: Instant) {
        self.widths.insert(column_id.into(), width);
        self.writer.call(self.widths.clone(), now);
    }

    /// Forget every resized width.
    pub fn reset(&mut self, now: Instant) {
        self.widths.clear();
        self.writer.call(BTreeMap::new(), now);
    }

    /// Write the pending map if its window has elapsed. Returns `true` if written.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.writer.poll(now) {
            Some(widths) => {
                write_json(&*self.store, &self.key, &widths);
                true
            }
            None => false,
        }
    }

    /// Write any pending map now.
    pub fn flush(&mut self) -> bool {
        match self.writer.flush() {
            Some(widths) => {
                write_json(&*self.store, &self.key, &widths);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.writer.is_pending()
    }
}

impl std::fmt::Debug for ColumnResizing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnResizing")
            .field("key", &self.key)
            .field("widths", &self.widths)
            .field("pending", &self.writer.is_pending())
            .finish_non_exhaustive()
    }
}
