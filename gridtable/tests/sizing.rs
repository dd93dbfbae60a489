mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::Data;
use gridtable::error::GridError;
use gridtable::model::{Column, ColumnWidth};
use gridtable::sizing::{calc_column_sizes, ColumnSize, ColumnSizing};

fn column(id: &str, width: &str) -> Column<Data> {
    Column::new(id).with_width(width.parse().unwrap())
}

fn mixed() -> Vec<Column<Data>> {
    vec![
        column("a", "100px"),
        column("b", "20%"),
        column("c", "1fr"),
        column("d", "3fr"),
    ]
}

fn px(sizes: &[ColumnSize]) -> Vec<Option<f64>> {
    sizes.iter().map(ColumnSize::px).collect()
}

#[test]
fn test_parse_widths() {
    assert_eq!("120px".parse::<ColumnWidth>().unwrap(), ColumnWidth::Px(120.0));
    assert_eq!("12.5%".parse::<ColumnWidth>().unwrap(), ColumnWidth::Percent(12.5));
    assert_eq!("2fr".parse::<ColumnWidth>().unwrap(), ColumnWidth::Fr(2.0));
    assert!(matches!(
        "10em".parse::<ColumnWidth>(),
        Err(GridError::InvalidWidth(w)) if w == "10em"
    ));
}

#[test]
fn test_known_width_resolves_to_pixels() {
    let sizes = calc_column_sizes(&mixed(), Some(1000.0), 0.0, &[], &BTreeMap::new());
    assert_eq!(
        px(&sizes),
        [Some(100.0), Some(200.0), Some(175.0), Some(525.0)]
    );
}

#[test]
fn test_unknown_width_uses_calc() {
    let sizes = calc_column_sizes(&mixed(), None, 0.0, &[], &BTreeMap::new());
    assert_eq!(sizes[0].to_string(), "100px");
    assert_eq!(sizes[1].to_string(), "20%");
    assert_eq!(
        sizes[2].to_string(),
        "calc((100% - 20% - 100px) * (1 / 4))"
    );
}

#[test]
fn test_min_table_width() {
    let sizes = calc_column_sizes(&mixed(), Some(400.0), 1000.0, &[], &BTreeMap::new());
    assert_eq!(
        px(&sizes),
        [Some(100.0), Some(200.0), Some(175.0), Some(525.0)]
    );
}

#[test]
fn test_resized_width_overrides_declared() {
    let resized = BTreeMap::from([("c".to_string(), 300.0)]);
    let sizes = calc_column_sizes(&mixed(), Some(1000.0), 0.0, &[], &resized);
    assert_eq!(
        px(&sizes),
        [Some(100.0), Some(200.0), Some(300.0), Some(400.0)]
    );
}

#[test]
fn test_expanded_width_and_minimum() {
    let columns = vec![
        column("address", "1fr").with_expanded_width(ColumnWidth::Px(250.0)),
        column("notes", "1fr").with_min_width(400.0),
    ];

    let collapsed = calc_column_sizes(&columns, Some(600.0), 0.0, &[], &BTreeMap::new());
    assert_eq!(px(&collapsed), [Some(300.0), Some(400.0)]);

    let expanded = calc_column_sizes(
        &columns,
        Some(600.0),
        0.0,
        &["address".to_string()],
        &BTreeMap::new(),
    );
    assert_eq!(px(&expanded), [Some(250.0), Some(400.0)]);
}

#[test]
fn test_first_width_applies_immediately_then_debounces() {
    let start = Instant::now();
    let mut sizing = ColumnSizing::new(Arc::from(mixed()), 0.0, Duration::from_millis(100));
    assert_eq!(sizing.table_width(), None);

    assert!(sizing.observe_width(1000.0, start));
    assert_eq!(sizing.sizes()[2], ColumnSize::Px(175.0));

    assert!(!sizing.observe_width(2000.0, start + Duration::from_millis(10)));
    assert!(!sizing.poll(start + Duration::from_millis(50)));
    assert_eq!(sizing.table_width(), Some(1000.0));

    assert!(sizing.poll(start + Duration::from_millis(110)));
    assert_eq!(sizing.table_width(), Some(2000.0));
}

#[test]
fn test_same_column_list_is_not_recomputed() {
    let columns: Arc<[Column<Data>]> = Arc::from(mixed());
    let mut sizing = ColumnSizing::new(Arc::clone(&columns), 0.0, Duration::ZERO);

    assert!(!sizing.set_columns(Arc::clone(&columns)));
    assert!(sizing.set_columns(Arc::from(vec![column("a", "1fr")])));

    let by_id = sizing.sizes_by_id();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].0, "a");
}
