mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{data, init_logging, Data};
use gridtable::columns::ColumnStates;
use gridtable::error::StorageError;
use gridtable::model::{Column, Row, RowKey};
use gridtable::rows::RowStates;
use gridtable::storage::{
    ColumnResizing, KeyValueStore, MemoryStore, RowStorage, ScrollStorage,
};

/// A store that fails every call, like storage in a locked-down browser.
struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disabled".to_string()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".to_string()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".to_string()))
    }
}

fn tree() -> Vec<Row<Data>> {
    vec![
        Row::new("parent", "a", "a").with_children(vec![data("a1", "x")]),
        Row::new("parent", "b", "b").with_children(vec![data("b1", "y")]),
    ]
}

#[test]
fn test_failing_store_degrades_to_defaults() {
    init_logging();
    let store: Arc<dyn KeyValueStore> = Arc::new(FailingStore);

    let columns: ColumnStates<Data> = ColumnStates::with_store(Arc::clone(&store));
    columns.set_columns(vec![Column::new("age").hideable(false)], Some("people"));
    assert!(!columns.is_visible("age"));
    columns.set_visible("age", true).unwrap();
    assert!(columns.is_visible("age"));

    let rows = RowStates::with_storage(Arc::clone(&store), "people");
    rows.set_rows(&tree());
    rows.toggle_collapsed(&RowKey::new("parent", "a")).unwrap();
    assert!(rows.is_collapsed(&RowKey::new("parent", "a")));

    let scroll = ScrollStorage::new(Arc::clone(&store), "/people", "grid");
    scroll.save(10);
    assert_eq!(scroll.load(), None);
}

#[test]
fn test_collapsed_rows_restore_once() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let first = RowStates::with_storage(Arc::clone(&store), "orders");
    first.set_rows(&tree());
    first.toggle_collapsed(&RowKey::new("parent", "b")).unwrap();
    assert_eq!(
        store.get_item("collapsedRows_orders").unwrap().as_deref(),
        Some(r#"["b"]"#)
    );

    let second = RowStates::with_storage(Arc::clone(&store), "orders");
    second.set_rows(&tree());
    assert!(second.is_collapsed(&RowKey::new("parent", "b")));
    assert!(!second.is_collapsed(&RowKey::new("parent", "a")));

    // Rows appearing after the first data pass start expanded
    let mut more = tree();
    more.push(Row::new("parent", "c", "c").with_children(vec![data("c1", "z")]));
    store.set_item("collapsedRows_orders", r#"["b","c"]"#).unwrap();
    second.set_rows(&more);
    assert!(!second.is_collapsed(&RowKey::new("parent", "c")));
}

#[test]
fn test_row_storage_waits_for_data_rows() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set_item("collapsedRows_orders", r#"["a"]"#).unwrap();

    let rows = RowStates::with_storage(Arc::clone(&store), "orders");
    rows.set_rows(&[Row::header("header")]);
    rows.set_rows(&tree());
    assert!(rows.is_collapsed(&RowKey::new("parent", "a")));
}

#[test]
fn test_unparseable_values_are_ignored() {
    init_logging();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set_item("collapsedRows_orders", "{not json").unwrap();
    store.set_item("scroll_/_grid", "\"seven\"").unwrap();

    let mut storage = RowStorage::new(Arc::clone(&store), "orders");
    storage.load();
    assert_eq!(storage.was_collapsed("a"), None);

    let scroll = ScrollStorage::new(Arc::clone(&store), "/", "grid");
    assert_eq!(scroll.load(), None);
    scroll.save(7);
    assert_eq!(scroll.load(), Some(7));
}

#[test]
fn test_resized_widths_are_debounced() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let start = Instant::now();
    let delay = Duration::from_millis(500);

    let mut resizing = ColumnResizing::new(Arc::clone(&store), "people", delay);
    resizing.set_resized_width("name", 120.0, start);
    resizing.set_resized_width("name", 140.0, start + Duration::from_millis(300));
    assert_eq!(resizing.width("name"), Some(140.0));

    assert!(!resizing.poll(start + Duration::from_millis(600)));
    assert_eq!(store.get_item("columnWidths_people").unwrap(), None);

    assert!(resizing.poll(start + Duration::from_millis(800)));
    assert_eq!(
        store.get_item("columnWidths_people").unwrap().as_deref(),
        Some(r#"{"name":140.0}"#)
    );

    let reloaded = ColumnResizing::new(Arc::clone(&store), "people", delay);
    assert_eq!(reloaded.width("name"), Some(140.0));
}

#[test]
fn test_reset_widths_flushes_empty_map() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let now = Instant::now();

    let mut resizing = ColumnResizing::new(Arc::clone(&store), "people", Duration::ZERO);
    resizing.set_resized_width("age", 80.0, now);
    resizing.reset(now);
    assert!(resizing.widths().is_empty());
    assert!(resizing.flush());
    assert_eq!(
        store.get_item("columnWidths_people").unwrap().as_deref(),
        Some("{}")
    );
    assert!(!resizing.flush());
}

#[test]
fn test_quota_errors_are_swallowed() {
    init_logging();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new().with_quota(8));
    let scroll = ScrollStorage::new(Arc::clone(&store), "/a/long/path", "grid");
    scroll.save(3);
    assert_eq!(scroll.load(), None);
}
