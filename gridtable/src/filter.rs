//! Text filter producing the ids fed to
//! [`RowStates::set_matched_rows`](crate::rows::RowStates::set_matched_rows).

use crate::model::{Column, Row};

/// Ids of rows matching `filter`.
///
/// The filter is split on whitespace into lower-cased terms; a row matches
/// when every term appears in at least one of its cells. A parent matches
/// when any descendant does, so the path to a match stays visible.
/// Reserved rows are skipped. An empty filter matches every row.
pub fn matched_row_ids<D>(columns: &[Column<D>], rows: &[Row<D>], filter: &str) -> Vec<String> {
    let terms: Vec<String> = filter.split_whitespace().map(str::to_lowercase).collect();
    let mut out = Vec::new();
    for row in rows {
        collect(columns, row, &terms, &mut out);
    }
    out
}

/// Returns `true` if `row` or any descendant matched.
fn collect<D>(columns: &[Column<D>], row: &Row<D>, terms: &[String], out: &mut Vec<String>) -> bool {
    if row.is_reserved() {
        return false;
    }
    let mut any_child = false;
    for child in row.children.iter().flatten() {
        any_child |= collect(columns, child, terms, out);
    }
    let matched = any_child || row_matches(columns, row, terms);
    if matched {
        out.push(row.id.clone());
    }
    matched
}

fn row_matches<D>(columns: &[Column<D>], row: &Row<D>, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let texts: Vec<String> = columns
        .iter()
        .filter_map(|c| c.cell(row))
        .filter_map(|cell| cell.text())
        .map(|text| text.to_lowercase())
        .collect();
    terms
        .iter()
        .all(|term| texts.iter().any(|text| text.contains(term.as_str())))
}
