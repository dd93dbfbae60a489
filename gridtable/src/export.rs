//! CSV export of the current view.

use crate::error::GridError;
use crate::model::{Column, Row};

/// Write `rows` as CSV with one record per row and a header of column names.
///
/// Action columns and reserved rows are skipped. Cells that only render an
/// element export as empty fields. Nested rows are written in pre-order.
pub fn to_csv<D>(columns: &[Column<D>], rows: &[Row<D>]) -> Result<String, GridError> {
    let columns: Vec<&Column<D>> = columns.iter().filter(|c| !c.is_action).collect();
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.name.as_deref().unwrap_or(&c.id)))?;
    let mut written = 0usize;
    for row in rows {
        write_row(&mut writer, &columns, row, &mut written)?;
    }
    writer.flush().map_err(|e| GridError::Export(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| GridError::Export(e.to_string()))?;
    log::debug!("Exported {} rows, {} columns to CSV", written, columns.len());
    String::from_utf8(bytes).map_err(|e| GridError::Export(e.to_string()))
}

fn write_row<D>(
    writer: &mut csv::Writer<Vec<u8>>,
    columns: &[&Column<D>],
    row: &Row<D>,
    written: &mut usize,
) -> Result<(), GridError> {
    if !row.is_reserved() {
        writer.write_record(columns.iter().map(|c| {
            c.cell(row)
                .and_then(|cell| cell.text())
                .unwrap_or_default()
        }))?;
        *written += 1;
    }
    for child in row.children.iter().flatten() {
        write_row(writer, columns, child, written)?;
    }
    Ok(())
}
