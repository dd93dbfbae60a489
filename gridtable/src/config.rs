//! Grid table configuration

use std::time::Duration;

use crate::sizing::SIZING_DEBOUNCE;
use crate::sort::SortConfig;
use crate::storage::RESIZE_DEBOUNCE;

/// Configuration for a [`GridTable`](crate::GridTable).
///
/// Persistence features are opt-in: each one needs its key set here and a
/// store passed to [`GridTable::with_store`](crate::GridTable::with_store).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gridtable::config::GridTableConfig;
///
/// let config = GridTableConfig::new("orders")
///     .with_path("/orders")
///     .with_persist_collapse("orders")
///     .with_persist_scroll(true)
///     .with_resize_debounce(Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct GridTableConfig {
    /// Identifies the table within a page; part of the scroll storage key.
    pub table_id: String,

    /// Page path; part of the scroll storage key.
    pub path: String,

    /// Key for persisted column visibility and expansion.
    ///
    /// Default: derived from the column ids when any column can be hidden
    pub visible_columns_storage_key: Option<String>,

    /// Key for persisted collapsed rows. `None` disables it.
    pub persist_collapse: Option<String>,

    /// Persist the first rendered row index per path and table.
    pub persist_scroll: bool,

    /// Key for persisted resized column widths. `None` disables it.
    pub resize_storage_key: Option<String>,

    pub sorting: SortConfig,

    /// The table never lays out narrower than this.
    ///
    /// Default: 0
    pub min_width_px: f64,

    /// Delay before resized widths are written.
    ///
    /// Default: 500ms
    pub resize_debounce: Duration,

    /// Delay applied to table width observations after the first.
    ///
    /// Default: 100ms
    pub sizing_debounce: Duration,
}

impl Default for GridTableConfig {
    fn default() -> Self {
        Self {
            table_id: "gridTable".to_string(),
            path: "/".to_string(),
            visible_columns_storage_key: None,
            persist_collapse: None,
            persist_scroll: false,
            resize_storage_key: None,
            sorting: SortConfig::default(),
            min_width_px: 0.0,
            resize_debounce: RESIZE_DEBOUNCE,
            sizing_debounce: SIZING_DEBOUNCE,
        }
    }
}

impl GridTableConfig {
    /// Create a config for the table `table_id`.
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Default::default()
        }
    }

    pub fn with_table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = table_id.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_visible_columns_storage_key(mut self, key: impl Into<String>) -> Self {
        self.visible_columns_storage_key = Some(key.into());
        self
    }

    pub fn with_persist_collapse(mut self, key: impl Into<String>) -> Self {
        self.persist_collapse = Some(key.into());
        self
    }

    pub fn with_persist_scroll(mut self, persist: bool) -> Self {
        self.persist_scroll = persist;
        self
    }

    pub fn with_resize_storage_key(mut self, key: impl Into<String>) -> Self {
        self.resize_storage_key = Some(key.into());
        self
    }

    pub fn with_sorting(mut self, sorting: SortConfig) -> Self {
        self.sorting = sorting;
        self
    }

    pub fn with_min_width_px(mut self, px: f64) -> Self {
        self.min_width_px = px;
        self
    }

    pub fn with_resize_debounce(mut self, delay: Duration) -> Self {
        self.resize_debounce = delay;
        self
    }

    pub fn with_sizing_debounce(mut self, delay: Duration) -> Self {
        self.sizing_debounce = delay;
        self
    }
}
