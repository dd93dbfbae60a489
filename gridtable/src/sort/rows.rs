//! Stable, pin-aware, nested row sorting.

use std::cmp::Ordering;

use crate::error::GridError;
use crate::model::{CellValue, Column, Pin, Row};

use super::state::{Direction, SortState};

/// Sort a row tree by `sort`, returning new vectors at every level.
///
/// Within each sibling list, pinned rows go first or last without being
/// compared to each other, then the primary column breaks ties before the
/// clicked column. Missing values sort first in both directions. Text is
/// compared lower-cased unless `case_sensitive`.
///
/// A data row whose cell only renders an element cannot be sorted and
/// yields [`GridError::UnsortableCell`]. A sort column that no longer
/// exists leaves rows in input order apart from pins.
///
/// # Example
///
/// ```
/// use gridtable::model::{Column, GridCell, Row};
/// use gridtable::sort::{SortState, sort_rows};
///
/// let columns = vec![Column::new("n").with_cell("data", |r: &Row<i32>| GridCell::value(r.data))];
/// let rows = vec![Row::new("data", "b", 2), Row::new("data", "a", 1)];
///
/// let sorted = sort_rows(&columns, &rows, &SortState::asc("n"), false).unwrap();
/// assert_eq!(sorted[0].id, "a");
/// assert_eq!(rows[0].id, "b");
/// ```
pub fn sort_rows<D: Clone>(
    columns: &[Column<D>],
    rows: &[Row<D>],
    sort: &SortState,
    case_sensitive: bool,
) -> Result<Vec<Row<D>>, GridError> {
    let column = columns.iter().find(|c| c.id == sort.column);
    if column.is_none() {
        log::warn!("Sort column {} not found, keeping input order", sort.column);
    }
    let primary = sort.primary.as_ref().and_then(|(id, direction)| {
        let found = columns.iter().find(|c| c.id == *id);
        if found.is_none() {
            log::warn!("Primary sort column {} not found", id);
        }
        found.map(|c| (c, *direction))
    });

    let sorter = Sorter {
        column: column.map(|c| (c, sort.direction)),
        primary,
        case_sensitive,
    };
    sorter.sort_level(rows)
}

struct Sorter<'a, D> {
    column: Option<(&'a Column<D>, Direction)>,
    primary: Option<(&'a Column<D>, Direction)>,
    case_sensitive: bool,
}

struct SortKey {
    primary: Option<CellValue>,
    value: Option<CellValue>,
}

impl<D: Clone> Sorter<'_, D> {
    fn sort_level(&self, rows: &[Row<D>]) -> Result<Vec<Row<D>>, GridError> {
        let keys = rows
            .iter()
            .map(|row| {
                // Pinned rows are never compared
                if row.pin.is_some() {
                    return Ok(SortKey {
                        primary: None,
                        value: None,
                    });
                }
                Ok(SortKey {
                    primary: self.key(self.primary, row)?,
                    value: self.key(self.column, row)?,
                })
            })
            .collect::<Result<Vec<_>, GridError>>()?;

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| {
            let (ra, rb) = (&rows[a], &rows[b]);
            Pin::order(ra.pin, rb.pin).then_with(|| {
                if ra.pin.is_some() {
                    return Ordering::Equal;
                }
                self.compare_keys(&keys[a], &keys[b])
            })
        });

        order
            .into_iter()
            .map(|i| {
                let row = &rows[i];
                let mut sorted = row.shallow_clone();
                sorted.children = match &row.children {
                    Some(children) => Some(self.sort_level(children)?),
                    None => None,
                };
                Ok(sorted)
            })
            .collect()
    }

    fn key(
        &self,
        column: Option<(&Column<D>, Direction)>,
        row: &Row<D>,
    ) -> Result<Option<CellValue>, GridError> {
        let Some((column, _)) = column else {
            return Ok(None);
        };
        let Some(cell) = column.cell(row) else {
            return Ok(None);
        };
        match cell.sort_value() {
            Some(CellValue::Null) => Ok(None),
            Some(value) => Ok(Some(value)),
            None if row.is_reserved() => Ok(None),
            None => Err(GridError::UnsortableCell {
                column: column.id.clone(),
                row: row.key(),
            }),
        }
    }

    fn compare_keys(&self, a: &SortKey, b: &SortKey) -> Ordering {
        let primary = match self.primary {
            Some((_, direction)) => compare(&a.primary, &b.primary, direction, self.case_sensitive),
            None => Ordering::Equal,
        };
        primary.then_with(|| match self.column {
            Some((_, direction)) => compare(&a.value, &b.value, direction, self.case_sensitive),
            None => Ordering::Equal,
        })
    }
}

/// Missing values first regardless of direction; only defined values are inverted.
fn compare(
    a: &Option<CellValue>,
    b: &Option<CellValue>,
    direction: Direction,
    case_sensitive: bool,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let ord = a.compare(b, case_sensitive);
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
    }
}
