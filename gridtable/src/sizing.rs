//! Column sizing
//!
//! Turns declared widths (`px`, `%`, `fr`) plus the observed table width into
//! one size per visible column. Before the table width is known, flexible
//! columns are expressed as `calc(...)` so a renderer can still lay them out.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::debounce::Debouncer;
use crate::model::{Column, ColumnWidth};

/// Default delay applied to table width observations after the first.
pub const SIZING_DEBOUNCE: Duration = Duration::from_millis(100);

/// Computed width of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSize {
    Px(f64),
    Percent(f64),
    /// A share of the space left after fixed and percentage columns.
    Flexible {
        claimed_percent: f64,
        claimed_px: f64,
        fr: f64,
        total_fr: f64,
        min_px: Option<f64>,
    },
}

impl ColumnSize {
    /// Concrete pixel width, if known.
    pub fn px(&self) -> Option<f64> {
        match self {
            ColumnSize::Px(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSize::Px(v) => write!(f, "{v}px"),
            ColumnSize::Percent(v) => write!(f, "{v}%"),
            ColumnSize::Flexible {
                claimed_percent,
                claimed_px,
                fr,
                total_fr,
                min_px,
            } => {
                let calc = format!(
                    "calc((100% - {claimed_percent}% - {claimed_px}px) * ({fr} / {total_fr}))"
                );
                match min_px {
                    Some(min) => write!(f, "max({min}px, {calc})"),
                    None => f.write_str(&calc),
                }
            }
        }
    }
}

/// Compute one size per column.
///
/// - `table_width`: observed width of the table, `None` before the first observation
/// - `min_width_px`: the table never lays out narrower than this
/// - `expanded_ids`: columns using their `expanded_width`
/// - `resized`: user-dragged widths, which override everything else
pub fn calc_column_sizes<D>(
    columns: &[Column<D>],
    table_width: Option<f64>,
    min_width_px: f64,
    expanded_ids: &[String],
    resized: &BTreeMap<String, f64>,
) -> Vec<ColumnSize> {
    let widths: Vec<ColumnWidth> = columns
        .iter()
        .map(|c| {
            if let Some(px) = resized.get(&c.id) {
                return ColumnWidth::Px(*px);
            }
            match c.expanded_width {
                Some(w) if expanded_ids.contains(&c.id) => w,
                _ => c.width,
            }
        })
        .collect();

    let mut claimed_percent = 0.0;
    let mut claimed_px = 0.0;
    let mut total_fr = 0.0;
    for (column, width) in columns.iter().zip(&widths) {
        match width {
            ColumnWidth::Px(v) => claimed_px += v.max(column.min_width.unwrap_or(0.0)),
            ColumnWidth::Percent(v) => claimed_percent += v,
            ColumnWidth::Fr(v) => total_fr += v,
        }
    }

    columns
        .iter()
        .zip(widths)
        .map(|(column, width)| {
            let min = column.min_width;
            let size = match (width, table_width) {
                (ColumnWidth::Px(v), _) => ColumnSize::Px(v),
                (ColumnWidth::Percent(v), None) => ColumnSize::Percent(v),
                (ColumnWidth::Percent(v), Some(w)) => ColumnSize::Px(w.max(min_width_px) * v / 100.0),
                (ColumnWidth::Fr(fr), None) => ColumnSize::Flexible {
                    claimed_percent,
                    claimed_px,
                    fr,
                    total_fr,
                    min_px: min,
                },
                (ColumnWidth::Fr(fr), Some(w)) => {
                    let basis = w.max(min_width_px);
                    let free = (basis - basis * claimed_percent / 100.0 - claimed_px).max(0.0);
                    let share = if total_fr > 0.0 { fr / total_fr } else { 0.0 };
                    ColumnSize::Px(free * share)
                }
            };
            match (size, min) {
                (ColumnSize::Px(v), Some(min)) => ColumnSize::Px(v.max(min)),
                (size, _) => size,
            }
        })
        .collect()
}

/// Keeps column sizes current as the table width and column list change.
///
/// The first width observation is applied immediately; later ones are
/// debounced and applied by [`ColumnSizing::poll`].
pub struct ColumnSizing<D> {
    columns: Arc<[Column<D>]>,
    min_width_px: f64,
    expanded: Vec<String>,
    resized: BTreeMap<String, f64>,
    width: Option<f64>,
    observed: bool,
    pending_width: Debouncer<f64>,
    sizes: Vec<ColumnSize>,
}

impl<D> ColumnSizing<D> {
    pub fn new(columns: Arc<[Column<D>]>, min_width_px: f64, delay: Duration) -> Self {
        let mut sizing = Self {
            columns,
            min_width_px,
            expanded: Vec::new(),
            resized: BTreeMap::new(),
            width: None,
            observed: false,
            pending_width: Debouncer::new(delay),
            sizes: Vec::new(),
        };
        sizing.recompute();
        sizing
    }

    fn recompute(&mut self) {
        self.sizes = calc_column_sizes(
            &self.columns,
            self.width,
            self.min_width_px,
            &self.expanded,
            &self.resized,
        );
        log::trace!(
            "Recomputed {} column sizes for width {:?}",
            self.sizes.len(),
            self.width
        );
    }

    pub fn sizes(&self) -> &[ColumnSize] {
        &self.sizes
    }

    /// Sizes paired with their column ids.
    pub fn sizes_by_id(&self) -> Vec<(String, ColumnSize)> {
        self.columns
            .iter()
            .zip(&self.sizes)
            .map(|(c, s)| (c.id.clone(), s.clone()))
            .collect()
    }

    pub fn table_width(&self) -> Option<f64> {
        self.width
    }

    pub fn columns(&self) -> &Arc<[Column<D>]> {
        &self.columns
    }

    /// Record a table width. Returns `true` if sizes were recomputed now.
    pub fn observe_width(&mut self, width: f64, now: Instant) -> bool {
        if !self.observed {
            self.observed = true;
            self.width = Some(width);
            self.recompute();
            return true;
        }
        self.pending_width.call(width, now);
        false
    }

    /// Apply a debounced width. Returns `true` if sizes were recomputed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_width.poll(now) {
            Some(width) => {
                self.width = Some(width);
                self.recompute();
                true
            }
            None => false,
        }
    }

    /// Swap the column list. Recomputes only when it is a different list.
    pub fn set_columns(&mut self, columns: Arc<[Column<D>]>) -> bool {
        if Arc::ptr_eq(&self.columns, &columns) {
            return false;
        }
        self.columns = columns;
        self.recompute();
        true
    }

    pub fn set_expanded(&mut self, expanded: Vec<String>) {
        if self.expanded != expanded {
            self.expanded = expanded;
            self.recompute();
        }
    }

    pub fn set_resized(&mut self, resized: &BTreeMap<String, f64>) {
        if &self.resized != resized {
            self.resized = resized.clone();
            self.recompute();
        }
    }
}

impl<D> fmt::Debug for ColumnSizing<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSizing")
            .field("columns", &self.columns.len())
            .field("width", &self.width)
            .field("sizes", &self.sizes)
            .finish_non_exhaustive()
    }
}
