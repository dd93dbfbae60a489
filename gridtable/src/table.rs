//! Grid table: wires the column, row, sort and sizing models together.

use std::sync::Arc;
use std::time::Instant;

use crate::columns::ColumnStates;
use crate::config::GridTableConfig;
use crate::error::GridError;
use crate::export;
use crate::filter::matched_row_ids;
use crate::lookup::{GridRowLookup, Virtualizer};
use crate::model::{Column, ExportTarget, Row, RowKey};
use crate::rows::{RowStates, SelectedState};
use crate::sizing::{ColumnSize, ColumnSizing};
use crate::sort::{SortController, SortState, sort_rows};
use crate::storage::{ColumnResizing, KeyValueStore, ScrollStorage};

/// One entry of the flattened render list.
#[derive(Debug, Clone)]
pub struct RenderedRow<D> {
    pub key: RowKey,
    /// The row, without its children.
    pub row: Row<D>,
    /// Nesting level; chrome and kept rows are at 0.
    pub depth: usize,
    /// Rendered because it is selected, despite the filter or the data hiding it.
    pub is_kept: bool,
    pub selected_state: SelectedState,
    pub collapsed: bool,
    pub has_children: bool,
    /// Columns to render, shared by every row of one pass.
    pub columns: Arc<[Column<D>]>,
}

/// A headless data grid.
///
/// Feed it columns and a row tree on every update; read back the flattened
/// render list, the row lookup and the column sizes.
///
/// # Example
///
/// ```
/// use gridtable::GridTable;
/// use gridtable::config::GridTableConfig;
/// use gridtable::model::{Column, GridCell, Row};
///
/// let mut table = GridTable::new(GridTableConfig::new("people"));
/// table
///     .set_columns(vec![
///         Column::new("name").with_cell("data", |r: &Row<String>| GridCell::value(r.data.clone())),
///     ])
///     .unwrap();
/// table
///     .set_rows(vec![
///         Row::new("data", "2", "bob".to_string()),
///         Row::new("data", "1", "alice".to_string()),
///     ])
///     .unwrap();
///
/// let ids: Vec<String> = table.rendered_rows().into_iter().map(|r| r.row.id).collect();
/// assert_eq!(ids, ["1", "2"]);
/// ```
pub struct GridTable<D> {
    config: GridTableConfig,
    columns: ColumnStates<D>,
    rows: RowStates<D>,
    sort: Option<SortController>,
    input: Vec<Row<D>>,
    /// Data rows in display order, when a client-side sort applies.
    sorted: Option<Vec<Row<D>>>,
    filter: String,
    visible: Arc<[Column<D>]>,
    visible_revision: Option<u64>,
    resizing: Option<ColumnResizing>,
    sizing: ColumnSizing<D>,
    scroll: Option<ScrollStorage>,
    virtualizer: Option<Arc<dyn Virtualizer>>,
}

impl<D: Clone> GridTable<D> {
    /// Create a table that persists nothing.
    pub fn new(config: GridTableConfig) -> Self {
        let visible: Arc<[Column<D>]> = Arc::from(Vec::new());
        Self {
            sizing: ColumnSizing::new(
                Arc::clone(&visible),
                config.min_width_px,
                config.sizing_debounce,
            ),
            columns: ColumnStates::new(),
            rows: RowStates::new(),
            sort: None,
            input: Vec::new(),
            sorted: None,
            filter: String::new(),
            visible,
            visible_revision: None,
            resizing: None,
            scroll: None,
            virtualizer: None,
            config,
        }
    }

    /// Create a table persisting the features enabled in `config` to `store`.
    pub fn with_store(config: GridTableConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let mut table = Self::new(config);
        let config = &table.config;

        table.columns = ColumnStates::with_store(Arc::clone(&store));
        if let Some(key) = &config.persist_collapse {
            table.rows = RowStates::with_storage(Arc::clone(&store), key);
        }
        table.resizing = config
            .resize_storage_key
            .as_deref()
            .map(|key| ColumnResizing::new(Arc::clone(&store), key, config.resize_debounce));
        table.scroll = config
            .persist_scroll
            .then(|| ScrollStorage::new(Arc::clone(&store), &config.path, &config.table_id));

        if let Some(resizing) = &table.resizing {
            table.sizing.set_resized(resizing.widths());
        }
        table
    }

    pub fn config(&self) -> &GridTableConfig {
        &self.config
    }

    /// The column model. Changes made through it show up on the next render.
    pub fn columns(&self) -> &ColumnStates<D> {
        &self.columns
    }

    /// The row model.
    pub fn rows(&self) -> &RowStates<D> {
        &self.rows
    }

    pub fn set_virtualizer(&mut self, virtualizer: Option<Arc<dyn Virtualizer>>) {
        self.virtualizer = virtualizer;
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Supply the column list.
    ///
    /// The sort state is seeded from the first non-empty list.
    pub fn set_columns(&mut self, columns: Vec<Column<D>>) -> Result<(), GridError> {
        if self.sort.is_none() && !columns.is_empty() {
            self.sort = Some(SortController::new(self.config.sorting.clone(), &columns));
        }
        self.columns
            .set_columns(columns, self.config.visible_columns_storage_key.as_deref());
        self.sync_columns();
        self.resort()
    }

    /// Drive any column loaders queued by `set_columns` or visibility changes.
    pub async fn run_pending_expansions(&mut self) -> Result<(), GridError> {
        let result = self.columns.run_pending_expansions().await;
        self.sync_columns();
        result
    }

    /// Supply the row tree.
    pub fn set_rows(&mut self, rows: Vec<Row<D>>) -> Result<(), GridError> {
        self.rows.set_rows(&rows);
        self.input = rows;
        if !self.filter.is_empty() {
            self.apply_filter();
        }
        self.resort()
    }

    /// Filter rows by whitespace-separated terms. An empty filter shows everything.
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.trim().to_string();
        self.apply_filter();
    }

    /// Mark exactly `ids` as matched, for callers filtering on their own.
    pub fn set_matched_rows(&mut self, ids: &[String]) {
        self.filter.clear();
        self.rows.set_matched_rows(ids);
    }

    fn apply_filter(&mut self) {
        if self.filter.is_empty() {
            self.rows.match_all();
            return;
        }
        self.sync_columns();
        let ids = matched_row_ids(&self.visible, &self.input, &self.filter);
        log::debug!("Filter {:?} matched {} rows", self.filter, ids.len());
        self.rows.set_matched_rows(&ids);
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref().and_then(SortController::sort_state)
    }

    /// Apply a header click on `column_id`.
    pub fn on_sort(&mut self, column_id: &str) -> Result<Option<SortState>, GridError> {
        let Some(sort) = self.sort.as_mut() else {
            return Ok(None);
        };
        let key = if sort.is_client_side() {
            if self
                .columns
                .get(column_id)
                .is_ok_and(|s| !s.column.client_side_sort || s.column.is_action)
            {
                log::debug!("Column {} does not sort client-side", column_id);
                return Ok(sort.sort_state().cloned());
            }
            column_id.to_string()
        } else {
            self.columns
                .get(column_id)
                .map(|s| s.column.sort_key().to_string())?
        };
        let state = sort.on_sort(&key).cloned();
        self.resort()?;
        Ok(state)
    }

    fn resort(&mut self) -> Result<(), GridError> {
        self.sync_columns();
        self.sorted = None;
        let Some(sort) = &self.sort else {
            return Ok(());
        };
        let Some(state) = sort.sort_state().filter(|_| sort.is_client_side()) else {
            return Ok(());
        };
        let data: Vec<Row<D>> = self
            .input
            .iter()
            .filter(|r| !r.is_reserved())
            .cloned()
            .collect();
        self.sorted = Some(sort_rows(
            &self.visible,
            &data,
            state,
            sort.case_sensitive(),
        )?);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    fn sync_columns(&mut self) {
        let revision = self.columns.revision();
        if self.visible_revision == Some(revision) {
            return;
        }
        self.visible = Arc::from(self.columns.all_visible_columns(ExportTarget::Web));
        self.sizing.set_columns(Arc::clone(&self.visible));
        self.sizing.set_expanded(self.columns.expanded_column_ids());
        self.visible_revision = Some(revision);
    }

    /// Columns to render, in order.
    pub fn visible_columns(&mut self) -> Arc<[Column<D>]> {
        self.sync_columns();
        Arc::clone(&self.visible)
    }

    /// The flattened render list.
    ///
    /// Chrome rows first, then kept rows, then the sorted tree without
    /// unmatched rows and without the children of collapsed rows.
    pub fn rendered_rows(&mut self) -> Vec<RenderedRow<D>> {
        self.sync_columns();
        let mut out = Vec::new();

        for row in self.input.iter().filter(|r| r.is_reserved()) {
            out.push(self.render(row, 0, false));
        }
        for row in self.rows.kept_rows() {
            out.push(self.render(&row, 0, true));
        }

        let data: Vec<&Row<D>> = match &self.sorted {
            Some(sorted) => sorted.iter().collect(),
            None => self.input.iter().filter(|r| !r.is_reserved()).collect(),
        };
        for row in data {
            self.flatten(row, 0, &mut out);
        }
        out
    }

    fn flatten(&self, row: &Row<D>, depth: usize, out: &mut Vec<RenderedRow<D>>) {
        let key = row.key();
        // Kept rows already render above the tree, their children stay in place
        let collapsed = if self.rows.is_kept(&key) {
            self.rows.is_collapsed(&key)
        } else if self.rows.is_matched(&key) {
            let rendered = self.render(row, depth, false);
            let collapsed = rendered.collapsed;
            out.push(rendered);
            collapsed
        } else {
            return;
        };
        if collapsed {
            return;
        }
        for child in row.children.iter().flatten() {
            self.flatten(child, depth + 1, out);
        }
    }

    fn render(&self, row: &Row<D>, depth: usize, is_kept: bool) -> RenderedRow<D> {
        let key = row.key();
        let selected_state = if key == RowKey::header() {
            self.rows.all_selected_state()
        } else {
            self.rows
                .selected_state(&key)
                .unwrap_or(SelectedState::Unchecked)
        };
        RenderedRow {
            selected_state,
            collapsed: self.rows.is_collapsed(&key),
            has_children: row.children.as_ref().is_some_and(|c| !c.is_empty()),
            row: row.shallow_clone(),
            depth,
            is_kept,
            key,
            columns: Arc::clone(&self.visible),
        }
    }

    /// Navigation over the current render list.
    pub fn row_lookup(&mut self) -> GridRowLookup<D> {
        let rows = self.rendered_rows().into_iter().map(|r| r.row).collect();
        GridRowLookup::new(rows, self.virtualizer.clone())
    }

    /// The current view as CSV, without action columns.
    pub fn to_csv(&mut self) -> Result<String, GridError> {
        let columns = self.columns.all_visible_columns(ExportTarget::Csv);
        let rows: Vec<Row<D>> = self.rendered_rows().into_iter().map(|r| r.row).collect();
        export::to_csv(&columns, &rows)
    }

    // -------------------------------------------------------------------------
    // Selection and collapse
    // -------------------------------------------------------------------------

    pub fn select_row(&self, key: &RowKey, selected: bool) -> Result<(), GridError> {
        self.rows.select(key, selected)
    }

    pub fn select_all(&self, selected: bool) {
        self.rows.select_all(selected);
    }

    pub fn toggle_collapsed(&self, key: &RowKey) -> Result<(), GridError> {
        self.rows.toggle_collapsed(key)
    }

    // -------------------------------------------------------------------------
    // Sizing
    // -------------------------------------------------------------------------

    /// Sizes of the visible columns, paired with their ids.
    pub fn column_sizes(&mut self) -> Vec<(String, ColumnSize)> {
        self.sync_columns();
        self.sizing.sizes_by_id()
    }

    /// Record the table's width. Returns `true` if sizes changed immediately.
    pub fn observe_width(&mut self, width: f64, now: Instant) -> bool {
        self.sizing.observe_width(width, now)
    }

    /// Record a user-dragged column width.
    pub fn resize_column(&mut self, column_id: &str, width: f64, now: Instant) {
        match self.resizing.as_mut() {
            Some(resizing) => {
                resizing.set_resized_width(column_id, width, now);
                self.sizing.set_resized(resizing.widths());
            }
            None => log::debug!("Ignoring resize of {}: resizing is not persisted", column_id),
        }
    }

    /// Forget every user-dragged width.
    pub fn reset_column_widths(&mut self, now: Instant) {
        if let Some(resizing) = self.resizing.as_mut() {
            resizing.reset(now);
            self.sizing.set_resized(resizing.widths());
        }
    }

    /// Apply debounced work that is due. Returns `true` if anything ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        let resized = self.sizing.poll(now);
        let written = self.resizing.as_mut().is_some_and(|r| r.poll(now));
        resized || written
    }

    /// Write any pending resized widths immediately.
    pub fn flush(&mut self) -> bool {
        self.resizing.as_mut().is_some_and(ColumnResizing::flush)
    }

    // -------------------------------------------------------------------------
    // Scroll
    // -------------------------------------------------------------------------

    /// Persisted first rendered row index, if scroll persistence is enabled.
    pub fn load_scroll(&self) -> Option<usize> {
        self.scroll.as_ref().and_then(ScrollStorage::load)
    }

    pub fn save_scroll(&self, start_index: usize) {
        if let Some(scroll) = &self.scroll {
            scroll.save(start_index);
        }
    }
}

impl<D> std::fmt::Debug for GridTable<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridTable")
            .field("table_id", &self.config.table_id)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
