#![allow(dead_code)]

use std::sync::Once;

use gridtable::model::{Column, GridCell, Row};
use simplelog::{Config, LevelFilter, TestLogger};

pub type Data = &'static str;

static LOGGER: Once = Once::new();

pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = TestLogger::init(LevelFilter::Trace, Config::default());
    });
}

/// A "name" column reading the row data for both parent and data rows.
pub fn name_column() -> Column<Data> {
    Column::new("name")
        .with_name("Name")
        .with_cell("data", |r: &Row<Data>| GridCell::value(r.data))
        .with_cell("parent", |r: &Row<Data>| GridCell::value(r.data))
}

pub fn data(id: &str, name: Data) -> Row<Data> {
    Row::new("data", id, name)
}

/// One parent with three unsorted children between two plain rows.
pub fn scenario_rows() -> Vec<Row<Data>> {
    vec![
        Row::new("parent", "2", "b").with_children(vec![
            data("2.1", "b1"),
            data("2.3", "b3"),
            data("2.2", "b2"),
        ]),
        data("1", "a"),
        data("3", "c"),
    ]
}

/// Ids in pre-order.
pub fn flatten_ids<D>(rows: &[Row<D>]) -> Vec<String> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.id.clone());
        if let Some(children) = &row.children {
            out.extend(flatten_ids(children));
        }
    }
    out
}
