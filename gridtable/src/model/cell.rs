//! Cell render descriptors and the values sorting and filtering read from them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

/// A sortable, filterable cell value.
///
/// These are the only shapes client-side sorting accepts. Anything else a
/// cell can render is a [`GridCell::Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value. Sorts before every defined value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Point in time.
    Date(DateTime<Utc>),
}

impl CellValue {
    /// Returns `true` if this is [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Date(_) => "date",
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::Text(_) => 3,
            CellValue::Date(_) => 4,
        }
    }

    /// Compare two defined values.
    ///
    /// Text is compared lower-cased unless `case_sensitive`. Values of
    /// different types order by type so that the comparison stays total.
    pub fn compare(&self, other: &CellValue, case_sensitive: bool) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => {
                if case_sensitive {
                    a.cmp(b)
                } else {
                    a.to_lowercase().cmp(&b.to_lowercase())
                }
            }
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(d: DateTime<Utc>) -> Self {
        CellValue::Date(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// A value computed only when it is read.
pub type DeferredValue = Arc<dyn Fn() -> CellValue + Send + Sync>;

/// What a column renders for one row.
#[derive(Clone)]
pub enum GridCell {
    /// A plain value.
    Value(CellValue),
    /// A value produced on demand.
    Deferred(DeferredValue),
    /// Render-only content (a widget, an icon). The string is a label for
    /// debugging; it is never sorted or filtered on.
    Element(String),
    /// Content with explicit value and sort value overrides.
    Content(Box<GridCellContent>),
}

/// A cell whose displayed content differs from its value.
#[derive(Clone)]
pub struct GridCellContent {
    /// What gets rendered.
    pub content: GridCell,
    /// Value used for filtering and CSV, and for sorting if `sort_value` is absent.
    pub value: Option<CellValue>,
    /// Value used for sorting.
    pub sort_value: Option<CellValue>,
}

impl GridCell {
    /// A plain value cell.
    pub fn value(value: impl Into<CellValue>) -> Self {
        GridCell::Value(value.into())
    }

    /// A value computed when read.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> CellValue + Send + Sync + 'static,
    {
        GridCell::Deferred(Arc::new(f))
    }

    /// Render-only content.
    pub fn element(label: impl Into<String>) -> Self {
        GridCell::Element(label.into())
    }

    /// Render `content` but sort and filter on `value`.
    pub fn content(content: GridCell, value: impl Into<CellValue>) -> Self {
        GridCell::Content(Box::new(GridCellContent {
            content,
            value: Some(value.into()),
            sort_value: None,
        }))
    }

    /// Attach an explicit sort value.
    pub fn with_sort_value(self, sort_value: impl Into<CellValue>) -> Self {
        match self {
            GridCell::Content(mut c) => {
                c.sort_value = Some(sort_value.into());
                GridCell::Content(c)
            }
            other => GridCell::Content(Box::new(GridCellContent {
                content: other,
                value: None,
                sort_value: Some(sort_value.into()),
            })),
        }
    }

    /// The value sorting compares: `sort_value`, then `value`, then the content.
    ///
    /// Returns `None` when the cell only renders an element.
    pub fn sort_value(&self) -> Option<CellValue> {
        match self {
            GridCell::Value(v) => Some(v.clone()),
            GridCell::Deferred(f) => Some(f()),
            GridCell::Element(_) => None,
            GridCell::Content(c) => c
                .sort_value
                .clone()
                .or_else(|| c.value.clone())
                .or_else(|| c.content.sort_value()),
        }
    }

    /// Text used for filtering and CSV export.
    pub fn text(&self) -> Option<String> {
        match self {
            GridCell::Value(v) => Some(v.to_string()),
            GridCell::Deferred(f) => Some(f().to_string()),
            GridCell::Element(_) => None,
            GridCell::Content(c) => c
                .value
                .as_ref()
                .map(ToString::to_string)
                .or_else(|| c.content.text()),
        }
    }
}

impl fmt::Debug for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridCell::Value(v) => f.debug_tuple("Value").field(v).finish(),
            GridCell::Deferred(_) => f.write_str("Deferred(..)"),
            GridCell::Element(label) => f.debug_tuple("Element").field(label).finish(),
            GridCell::Content(c) => f
                .debug_struct("Content")
                .field("content", &c.content)
                .field("value", &c.value)
                .field("sort_value", &c.sort_value)
                .finish(),
        }
    }
}

impl From<CellValue> for GridCell {
    fn from(v: CellValue) -> Self {
        GridCell::Value(v)
    }
}
