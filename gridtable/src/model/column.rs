//! Column definitions

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ExpandError, GridError};

use super::cell::GridCell;
use super::row::Row;

/// Renders one cell of a column for a row of a given kind.
pub type CellFn<D> = Arc<dyn Fn(&Row<D>) -> GridCell + Send + Sync>;

/// Declared width of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Fixed pixel width.
    Px(f64),
    /// Percentage of the table width.
    Percent(f64),
    /// Share of the space left after fixed and percentage columns.
    Fr(f64),
}

impl Default for ColumnWidth {
    fn default() -> Self {
        ColumnWidth::Fr(1.0)
    }
}

impl FromStr for ColumnWidth {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse = |num: &str| {
            num.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .ok_or_else(|| GridError::InvalidWidth(s.to_string()))
        };

        if let Some(num) = trimmed.strip_suffix("px") {
            Ok(ColumnWidth::Px(parse(num)?))
        } else if let Some(num) = trimmed.strip_suffix('%') {
            Ok(ColumnWidth::Percent(parse(num)?))
        } else if let Some(num) = trimmed.strip_suffix("fr") {
            Ok(ColumnWidth::Fr(parse(num)?))
        } else {
            Err(GridError::InvalidWidth(s.to_string()))
        }
    }
}

impl fmt::Display for ColumnWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnWidth::Px(v) => write!(f, "{v}px"),
            ColumnWidth::Percent(v) => write!(f, "{v}%"),
            ColumnWidth::Fr(v) => write!(f, "{v}fr"),
        }
    }
}

/// Horizontal pin of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnPin {
    Left,
    Right,
}

/// Where a flattened column list is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportTarget {
    /// Interactive rendering; every visible column.
    #[default]
    Web,
    /// CSV download; action columns are dropped.
    Csv,
}

/// Asynchronously produces the child columns of an expandable column.
#[async_trait]
pub trait ColumnLoader<D>: Send + Sync {
    /// Load the child columns.
    async fn load(&self) -> Result<Vec<Column<D>>, ExpandError>;
}

/// Adapts an async closure into a [`ColumnLoader`].
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<D, F, Fut> ColumnLoader<D> for FnLoader<F>
where
    D: 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Column<D>>, ExpandError>> + Send + 'static,
{
    async fn load(&self) -> Result<Vec<Column<D>>, ExpandError> {
        (self.0)().await
    }
}

/// Child columns revealed when a column is expanded.
pub enum ExpandColumns<D> {
    /// A static list, applied synchronously.
    Columns(Vec<Column<D>>),
    /// A loader that is awaited on first expansion.
    Loader(Arc<dyn ColumnLoader<D>>),
}

impl<D: 'static> ExpandColumns<D> {
    /// Wrap an async closure as a loader.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Column<D>>, ExpandError>> + Send + 'static,
    {
        ExpandColumns::Loader(Arc::new(FnLoader(f)))
    }
}

impl<D> Clone for ExpandColumns<D> {
    fn clone(&self) -> Self {
        match self {
            ExpandColumns::Columns(cols) => ExpandColumns::Columns(cols.clone()),
            ExpandColumns::Loader(loader) => ExpandColumns::Loader(Arc::clone(loader)),
        }
    }
}

impl<D> fmt::Debug for ExpandColumns<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandColumns::Columns(cols) => f.debug_tuple("Columns").field(cols).finish(),
            ExpandColumns::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

/// A column definition.
///
/// Columns are plain values re-supplied on every update. Their `id` must be
/// unique within a list and stable for a logical column, since visibility and
/// expansion state are tracked by it.
///
/// # Example
///
/// ```
/// use gridtable::model::{Column, GridCell, Row};
///
/// let name: Column<&str> = Column::new("name")
///     .with_name("Name")
///     .with_width("2fr".parse().unwrap())
///     .with_cell("data", |row: &Row<&str>| GridCell::value(row.data));
///
/// let row = Row::new("data", "1", "alice");
/// assert!(name.cell(&row).is_some());
/// ```
pub struct Column<D> {
    pub id: String,
    pub name: Option<String>,
    /// Cell renderers keyed by row kind.
    pub cells: HashMap<String, CellFn<D>>,
    pub width: ColumnWidth,
    /// Minimum width in pixels.
    pub min_width: Option<f64>,
    /// Width used while the column is expanded.
    pub expanded_width: Option<ColumnWidth>,
    pub can_hide: bool,
    pub init_visible: bool,
    pub init_expanded: bool,
    /// Drop this column itself from the flattened list while expanded.
    pub hide_on_expand: bool,
    pub expand_columns: Option<ExpandColumns<D>>,
    /// `false` excludes the column from client-side sorting.
    pub client_side_sort: bool,
    /// Token passed to a server-side sort callback instead of the column id.
    pub server_side_sort_key: Option<String>,
    pub pin: Option<ColumnPin>,
    /// Row actions (buttons, menus); never exported.
    pub is_action: bool,
}

impl<D> Column<D> {
    /// Create a column with default settings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            cells: HashMap::new(),
            width: ColumnWidth::default(),
            min_width: None,
            expanded_width: None,
            can_hide: false,
            init_visible: true,
            init_expanded: false,
            hide_on_expand: false,
            expand_columns: None,
            client_side_sort: true,
            server_side_sort_key: None,
            pin: None,
            is_action: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register the renderer for rows of `kind`.
    pub fn with_cell<F>(mut self, kind: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Row<D>) -> GridCell + Send + Sync + 'static,
    {
        self.cells.insert(kind.into(), Arc::new(f));
        self
    }

    pub fn with_width(mut self, width: ColumnWidth) -> Self {
        self.width = width;
        self
    }

    pub fn with_min_width(mut self, px: f64) -> Self {
        self.min_width = Some(px);
        self
    }

    pub fn with_expanded_width(mut self, width: ColumnWidth) -> Self {
        self.expanded_width = Some(width);
        self
    }

    /// Allow the user to hide this column.
    pub fn hideable(mut self, init_visible: bool) -> Self {
        self.can_hide = true;
        self.init_visible = init_visible;
        self
    }

    pub fn with_init_expanded(mut self, expanded: bool) -> Self {
        self.init_expanded = expanded;
        self
    }

    pub fn with_hide_on_expand(mut self, hide: bool) -> Self {
        self.hide_on_expand = hide;
        self
    }

    pub fn with_expand_columns(mut self, expand: ExpandColumns<D>) -> Self {
        self.expand_columns = Some(expand);
        self
    }

    pub fn with_client_side_sort(mut self, sortable: bool) -> Self {
        self.client_side_sort = sortable;
        self
    }

    pub fn with_server_side_sort_key(mut self, key: impl Into<String>) -> Self {
        self.server_side_sort_key = Some(key.into());
        self
    }

    pub fn pinned(mut self, pin: ColumnPin) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Mark as an action column.
    pub fn action(mut self) -> Self {
        self.is_action = true;
        self
    }

    /// Render this column's cell for `row`, if a renderer exists for its kind.
    pub fn cell(&self, row: &Row<D>) -> Option<GridCell> {
        self.cells.get(&row.kind).map(|f| f(row))
    }

    /// Returns `true` if the column can be expanded.
    pub fn is_expandable(&self) -> bool {
        self.expand_columns.is_some()
    }

    /// Key used when this column drives a server-side sort.
    pub fn sort_key(&self) -> &str {
        self.server_side_sort_key.as_deref().unwrap_or(&self.id)
    }
}

impl<D> Clone for Column<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            cells: self.cells.clone(),
            width: self.width,
            min_width: self.min_width,
            expanded_width: self.expanded_width,
            can_hide: self.can_hide,
            init_visible: self.init_visible,
            init_expanded: self.init_expanded,
            hide_on_expand: self.hide_on_expand,
            expand_columns: self.expand_columns.clone(),
            client_side_sort: self.client_side_sort,
            server_side_sort_key: self.server_side_sort_key.clone(),
            pin: self.pin,
            is_action: self.is_action,
        }
    }
}

impl<D> fmt::Debug for Column<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.cells.keys().collect();
        kinds.sort();
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cells", &kinds)
            .field("width", &self.width)
            .field("can_hide", &self.can_hide)
            .field("init_visible", &self.init_visible)
            .field("init_expanded", &self.init_expanded)
            .field("expand_columns", &self.expand_columns)
            .field("client_side_sort", &self.client_side_sort)
            .field("is_action", &self.is_action)
            .finish_non_exhaustive()
    }
}
