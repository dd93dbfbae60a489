mod common;

use common::{data, flatten_ids, init_logging, name_column, scenario_rows, Data};
use gridtable::error::GridError;
use gridtable::model::{Column, GridCell, Pin, Row};
use gridtable::sort::{
    derive_sort_state, sort_rows, Direction, InitialSort, SortConfig, SortController, SortState,
};

#[test]
fn test_scenario_ascending_and_descending() {
    init_logging();
    let columns = vec![name_column()];
    let rows = scenario_rows();

    let asc = sort_rows(&columns, &rows, &SortState::asc("name"), false).unwrap();
    assert_eq!(flatten_ids(&asc), ["1", "2", "2.1", "2.2", "2.3", "3"]);

    let desc = sort_rows(&columns, &rows, &SortState::desc("name"), false).unwrap();
    assert_eq!(flatten_ids(&desc), ["3", "2", "2.3", "2.2", "2.1", "1"]);
}

#[test]
fn test_sort_does_not_touch_input() {
    let columns = vec![name_column()];
    let rows = scenario_rows();
    let before = flatten_ids(&rows);

    let _ = sort_rows(&columns, &rows, &SortState::desc("name"), false).unwrap();
    assert_eq!(flatten_ids(&rows), before);
}

#[test]
fn test_pinned_rows_ignore_direction() {
    let columns = vec![name_column()];
    let rows = vec![
        data("z", "zzz").pinned(Pin::First),
        data("m", "mmm"),
        data("a", "aaa").pinned(Pin::Last),
        data("b", "bbb"),
    ];

    let asc = sort_rows(&columns, &rows, &SortState::asc("name"), false).unwrap();
    assert_eq!(flatten_ids(&asc), ["z", "b", "m", "a"]);

    let desc = sort_rows(&columns, &rows, &SortState::desc("name"), false).unwrap();
    assert_eq!(flatten_ids(&desc), ["z", "m", "b", "a"]);
}

#[test]
fn test_primary_column_sorts_first() {
    let group: Column<Data> = Column::new("group").with_cell("data", |r: &Row<Data>| {
        GridCell::value(if r.id.starts_with('x') { "x" } else { "y" })
    });
    let columns = vec![group, name_column()];
    let rows = vec![
        data("y1", "a"),
        data("x1", "c"),
        data("y2", "b"),
        data("x2", "d"),
    ];

    let sort = SortState::desc("name").with_primary("group", Direction::Asc);
    let sorted = sort_rows(&columns, &rows, &sort, false).unwrap();
    assert_eq!(flatten_ids(&sorted), ["x2", "x1", "y2", "y1"]);
}

#[test]
fn test_case_sensitivity() {
    let columns = vec![name_column()];
    let rows = vec![data("1", "b"), data("2", "B"), data("3", "a")];

    let insensitive = sort_rows(&columns, &rows, &SortState::asc("name"), false).unwrap();
    assert_eq!(flatten_ids(&insensitive)[0], "3");

    let sensitive = sort_rows(&columns, &rows, &SortState::asc("name"), true).unwrap();
    assert_eq!(flatten_ids(&sensitive), ["2", "3", "1"]);
}

#[test]
fn test_element_cell_is_unsortable() {
    let icon: Column<Data> =
        Column::new("icon").with_cell("data", |_: &Row<Data>| GridCell::element("icon"));
    let rows = vec![data("1", "a"), data("2", "b")];

    let err = sort_rows(&[icon], &rows, &SortState::asc("icon"), false).unwrap_err();
    assert!(matches!(err, GridError::UnsortableCell { ref column, .. } if column == "icon"));
}

#[test]
fn test_element_cell_with_sort_value_sorts() {
    let icon: Column<Data> = Column::new("icon").with_cell("data", |r: &Row<Data>| {
        GridCell::element("icon").with_sort_value(r.data)
    });
    let rows = vec![data("1", "b"), data("2", "a")];

    let sorted = sort_rows(&[icon], &rows, &SortState::asc("icon"), false).unwrap();
    assert_eq!(flatten_ids(&sorted), ["2", "1"]);
}

#[test]
fn test_pinned_element_row_is_not_compared() {
    let name = name_column().with_cell("add", |_: &Row<Data>| GridCell::element("button"));
    let rows = vec![
        data("b", "b"),
        Row::new("add", "new", "").pinned(Pin::First),
        data("a", "a"),
    ];

    let sorted = sort_rows(&[name], &rows, &SortState::asc("name"), false).unwrap();
    assert_eq!(flatten_ids(&sorted), ["new", "a", "b"]);
}

#[test]
fn test_missing_column_keeps_order() {
    init_logging();
    let rows = scenario_rows();
    let sorted = sort_rows(&[name_column()], &rows, &SortState::asc("nope"), false).unwrap();
    assert_eq!(flatten_ids(&sorted), flatten_ids(&rows));
}

// ============================================================================
// Header click state machine
// ============================================================================

#[test]
fn test_derive_without_initial() {
    let asc = SortState::asc("1");
    assert_eq!(derive_sort_state(Some(&asc), "1", None), Some(SortState::desc("1")));

    let desc = SortState::desc("1");
    assert_eq!(derive_sort_state(Some(&desc), "1", None), None);
}

#[test]
fn test_derive_cycle_on_initial_column() {
    let initial = SortState::asc("name");
    let mut state = Some(initial.clone());
    let mut seen = Vec::new();
    for _ in 0..4 {
        state = derive_sort_state(state.as_ref(), "name", Some(&initial));
        seen.push(state.as_ref().map(|s| s.direction));
    }
    assert_eq!(
        seen,
        [
            Some(Direction::Desc),
            Some(Direction::Asc),
            Some(Direction::Desc),
            Some(Direction::Asc)
        ]
    );
}

#[test]
fn test_derive_other_column_reverts_to_initial() {
    let initial = SortState::asc("name");
    let state = derive_sort_state(Some(&initial), "age", Some(&initial));
    assert_eq!(state, Some(SortState::asc("age")));

    let state = derive_sort_state(state.as_ref(), "age", Some(&initial));
    assert_eq!(state, Some(SortState::desc("age")));

    let state = derive_sort_state(state.as_ref(), "age", Some(&initial));
    assert_eq!(state, Some(initial));
}

#[test]
fn test_controller_initial_skips_unsortable_columns() {
    let columns: Vec<Column<Data>> = vec![
        Column::new("menu").action(),
        Column::new("icon").with_client_side_sort(false),
        name_column(),
    ];
    let controller = SortController::new(SortConfig::client(), &columns);
    assert_eq!(controller.sort_state(), Some(&SortState::asc("name")));

    let controller = SortController::new(
        SortConfig::client().with_initial(InitialSort::Unsorted),
        &columns,
    );
    assert_eq!(controller.sort_state(), None);
}

#[test]
fn test_server_sort_reports_clicks() {
    use std::sync::{Arc, Mutex};

    let reported: Arc<Mutex<Vec<Option<SortState>>>> = Arc::default();
    let sink = Arc::clone(&reported);
    let config = SortConfig::server(None, move |state: Option<&SortState>| {
        sink.lock().unwrap().push(state.cloned());
    });
    let mut controller = SortController::new::<Data>(config, &[]);

    controller.on_sort("created");
    controller.on_sort("created");
    controller.on_sort("created");

    assert_eq!(
        *reported.lock().unwrap(),
        [Some(SortState::asc("created")), Some(SortState::desc("created")), None]
    );
}
