//! Navigation over the rendered row list.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GridError;
use crate::model::{Row, RowKey};

/// How a virtualizer should move to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// The windowed-rendering collaborator.
pub trait Virtualizer: Send + Sync {
    /// Bring the row at `index` of the rendered list into view.
    fn scroll_to_index(&self, index: usize, behavior: ScrollBehavior);
}

/// Rows immediately before and after a target.
#[derive(Debug)]
pub struct NextPrev<'a, D> {
    pub prev: Option<&'a Row<D>>,
    pub next: Option<&'a Row<D>>,
}

impl<D> Default for NextPrev<'_, D> {
    fn default() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }
}

impl<D> Clone for NextPrev<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for NextPrev<'_, D> {}

/// Neighbours of a row, globally and among rows of each kind.
#[derive(Debug)]
pub struct LookupResult<'a, D> {
    pub global: NextPrev<'a, D>,
    pub by_kind: HashMap<&'a str, NextPrev<'a, D>>,
}

impl<'a, D> LookupResult<'a, D> {
    /// Neighbours among rows of `kind`.
    pub fn kind(&self, kind: &str) -> NextPrev<'a, D> {
        self.by_kind.get(kind).copied().unwrap_or_default()
    }
}

/// Row predicate used to skip rows during a lookup.
pub type RowFilter<'f, D> = &'f dyn Fn(&Row<D>) -> bool;

/// Answers "what is before/after this row" over the rendered list and
/// drives scrolling through a [`Virtualizer`].
///
/// # Example
///
/// ```
/// use gridtable::lookup::GridRowLookup;
/// use gridtable::model::Row;
///
/// let lookup = GridRowLookup::new(
///     vec![Row::header(()), Row::new("a", "1", ()), Row::new("b", "2", ()), Row::new("a", "3", ())],
///     None,
/// );
/// let target = Row::new("b", "2", ());
/// let result = lookup.lookup(&target, None);
/// assert_eq!(result.global.prev.map(|r| r.id.as_str()), Some("1"));
/// assert_eq!(result.kind("a").next.map(|r| r.id.as_str()), Some("3"));
/// assert!(lookup.scroll_to("a", "1").is_err());
/// ```
pub struct GridRowLookup<D> {
    rows: Vec<Row<D>>,
    virtualizer: Option<Arc<dyn Virtualizer>>,
}

impl<D> GridRowLookup<D> {
    /// Wrap the rendered rows, chrome rows included, in display order.
    pub fn new(rows: Vec<Row<D>>, virtualizer: Option<Arc<dyn Virtualizer>>) -> Self {
        Self { rows, virtualizer }
    }

    /// Rendered rows without chrome rows.
    pub fn current_list(&self) -> Vec<&Row<D>> {
        self.rows.iter().filter(|r| !r.is_reserved()).collect()
    }

    /// Single pass over the current list collecting global and per-kind neighbours.
    ///
    /// Rows rejected by `filter` are skipped; the target itself is always recognised.
    pub fn lookup<'a>(&'a self, row: &Row<D>, filter: Option<RowFilter<'_, D>>) -> LookupResult<'a, D> {
        let target = row.key();
        let mut global = NextPrev::default();
        let mut by_kind: HashMap<&'a str, NextPrev<'a, D>> = HashMap::new();
        let mut passed = false;

        for r in self.rows.iter().filter(|r| !r.is_reserved()) {
            if r.is(&target) {
                passed = true;
                continue;
            }
            if filter.is_some_and(|f| !f(r)) {
                continue;
            }
            let kind = by_kind.entry(r.kind.as_str()).or_default();
            if passed {
                global.next.get_or_insert(r);
                kind.next.get_or_insert(r);
            } else {
                global.prev = Some(r);
                kind.prev = Some(r);
            }
        }

        if !passed {
            log::debug!("Lookup target {} is not in the current list", target);
        }
        LookupResult { global, by_kind }
    }

    /// Index of a row in the rendered list.
    pub fn index_of(&self, key: &RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.is(key))
    }

    /// Smoothly scroll the virtualizer to a row. Returns the row's index.
    pub fn scroll_to(&self, kind: &str, id: &str) -> Result<usize, GridError> {
        let virtualizer = self
            .virtualizer
            .as_ref()
            .ok_or(GridError::NotVirtualized)?;
        let key = RowKey::new(kind, id);
        let index = self
            .index_of(&key)
            .ok_or_else(|| GridError::RowNotInList(key.clone()))?;
        log::trace!("Scrolling to {} at index {}", key, index);
        virtualizer.scroll_to_index(index, ScrollBehavior::Smooth);
        Ok(index)
    }

    pub fn is_virtualized(&self) -> bool {
        self.virtualizer.is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<D> std::fmt::Debug for GridRowLookup<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridRowLookup")
            .field("rows", &self.rows.len())
            .field("virtualized", &self.is_virtualized())
            .finish()
    }
}
