mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::{init_logging, Data};
use futures::channel::oneshot;
use gridtable::columns::{default_storage_key, ColumnStates, ExpansionState};
use gridtable::error::{ExpandError, GridError};
use gridtable::model::{Column, ExpandColumns, ExportTarget};
use gridtable::observe::ColumnChange;
use gridtable::storage::{ColumnStorage, KeyValueStore, MemoryStore};

fn ids(columns: Vec<Column<Data>>) -> Vec<String> {
    columns.into_iter().map(|c| c.id).collect()
}

/// An expandable, initially hidden column whose loader counts its calls.
fn lazy_column(calls: &Arc<AtomicUsize>) -> Column<Data> {
    let calls = Arc::clone(calls);
    Column::new("details")
        .hideable(false)
        .with_init_expanded(true)
        .with_expand_columns(ExpandColumns::from_fn(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(vec![Column::new("street"), Column::new("city")]) }
        }))
}

#[tokio::test]
async fn test_showing_expanded_column_loads_once() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let states = ColumnStates::new();

    states.set_columns(vec![Column::new("name"), lazy_column(&calls)], None);
    assert!(!states.is_visible("details"));
    assert!(states.pending_expansions().is_empty());

    states.set_visible("details", true).unwrap();
    // Re-supplying definitions (with a fresh loader) must not queue a second load
    states.set_columns(vec![Column::new("name"), lazy_column(&calls)], None);
    assert_eq!(states.pending_expansions(), ["details"]);
    assert_eq!(states.expansion_state("details"), Some(ExpansionState::Expanding));

    states.run_pending_expansions().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(states.expansion_state("details"), Some(ExpansionState::Expanded));
    assert_eq!(
        ids(states.all_visible_columns(ExportTarget::Web)),
        ["name", "details", "street", "city"]
    );

    // Already resolved: nothing left to do
    states.do_expand("details", false).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_force_expand_reloads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let states = ColumnStates::new();
    states.set_columns(vec![lazy_column(&calls)], None);
    states.set_visible("details", true).unwrap();
    states.run_pending_expansions().await.unwrap();

    states.do_expand("details", true).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        states.children_ids("details"),
        Some(vec!["street".to_string(), "city".to_string()])
    );
}

#[tokio::test]
async fn test_do_expand_runs_queued_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let states = ColumnStates::new();
    states.set_columns(vec![lazy_column(&calls).with_init_expanded(false)], None);
    states.set_visible("details", true).unwrap();

    states.toggle_expanded("details").unwrap();
    assert_eq!(states.pending_expansions(), ["details"]);

    states.do_expand("details", false).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(states.pending_expansions().is_empty());
    assert!(!states.is_loading("details"));
    assert_eq!(
        states.children_ids("details"),
        Some(vec!["street".to_string(), "city".to_string()])
    );

    // Nothing left for the batch runner
    states.run_pending_expansions().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_do_expand_during_load_is_a_noop_unless_forced() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (release, gate) = oneshot::channel::<()>();
    let gate = Arc::new(Mutex::new(Some(gate)));

    let counter = Arc::clone(&calls);
    let column: Column<Data> =
        Column::new("details").with_expand_columns(ExpandColumns::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let gate = gate.lock().unwrap().take();
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(vec![Column::new("street")])
            }
        }));
    let states = ColumnStates::new();
    states.set_columns(vec![column], None);

    let first = states.do_expand("details", false);
    let second = async {
        assert!(states.is_loading("details"));
        states.do_expand("details", false).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        states.do_expand("details", true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let _ = release.send(());
    };
    let (first, ()) = futures::join!(first, second);
    first.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!states.is_loading("details"));
    assert_eq!(states.children_ids("details"), Some(vec!["street".to_string()]));
}

#[tokio::test]
async fn test_loader_failure_is_reported() {
    init_logging();
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(
        vec![Column::new("broken").with_expand_columns(ExpandColumns::from_fn(|| async {
            Err(ExpandError::new("backend down"))
        }))],
        None,
    );

    states.toggle_expanded("broken").unwrap();
    let err = states.run_pending_expansions().await.unwrap_err();
    assert!(matches!(err, GridError::Expand(ref e) if e.message == "backend down"));
    assert!(!states.is_loading("broken"));
    assert!(states.is_expanded("broken"));
    assert_eq!(states.children_ids("broken"), None);
}

#[test]
fn test_static_children_apply_synchronously() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(
        vec![
            Column::new("address")
                .with_hide_on_expand(true)
                .with_expand_columns(ExpandColumns::Columns(vec![
                    Column::new("street"),
                    Column::new("city"),
                ])),
            Column::new("age"),
        ],
        None,
    );
    assert_eq!(ids(states.all_visible_columns(ExportTarget::Web)), ["address", "age"]);

    states.toggle_expanded("address").unwrap();
    assert_eq!(
        ids(states.all_visible_columns(ExportTarget::Web)),
        ["street", "city", "age"]
    );
    assert_eq!(states.expanded_column_ids(), ["address"]);

    states.toggle_expanded("address").unwrap();
    assert_eq!(ids(states.all_visible_columns(ExportTarget::Web)), ["address", "age"]);
}

#[test]
fn test_hidden_column_does_not_expand() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(vec![Column::new("notes").hideable(false)], None);

    states.toggle_expanded("notes").unwrap();
    assert!(!states.is_expanded("notes"));
}

#[test]
fn test_csv_target_drops_actions() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(vec![Column::new("name"), Column::new("menu").action()], None);

    assert_eq!(ids(states.all_visible_columns(ExportTarget::Web)), ["name", "menu"]);
    assert_eq!(ids(states.all_visible_columns(ExportTarget::Csv)), ["name"]);
}

#[test]
fn test_set_visible_columns_only_touches_hideable() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(
        vec![
            Column::new("name"),
            Column::new("age").hideable(true),
            Column::new("notes").hideable(false),
        ],
        None,
    );

    states.set_visible_columns(&["notes".to_string()]);
    assert_eq!(states.visible_column_ids(), ["name", "notes"]);
}

#[test]
fn test_visibility_persists_across_instances() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let columns = || {
        vec![
            Column::<Data>::new("name"),
            Column::new("age").hideable(true),
            Column::new("notes").hideable(false),
        ]
    };

    let first = ColumnStates::with_store(Arc::clone(&store));
    first.set_columns(columns(), Some("people"));
    first.set_visible("age", false).unwrap();
    first.set_visible("notes", true).unwrap();

    let saved = store
        .get_item(&ColumnStorage::visible_key("people"))
        .unwrap()
        .unwrap();
    assert_eq!(saved, r#"["name","notes"]"#);

    let second = ColumnStates::with_store(Arc::clone(&store));
    second.set_columns(columns(), Some("people"));
    assert_eq!(second.visible_column_ids(), ["name", "notes"]);
}

#[test]
fn test_derived_key_ignores_visibility() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let columns = || {
        vec![
            Column::<Data>::new("name"),
            Column::new("age").hideable(true),
        ]
    };
    let key = default_storage_key(&columns());
    assert_eq!(key.len(), 16);

    let first = ColumnStates::with_store(Arc::clone(&store));
    first.set_columns(columns(), None);
    first.set_visible("age", false).unwrap();
    assert_eq!(default_storage_key(&columns()), key);

    let second = ColumnStates::with_store(Arc::clone(&store));
    second.set_columns(columns(), None);
    assert_eq!(second.visible_column_ids(), ["name"]);
    assert!(
        store
            .get_item(&ColumnStorage::visible_key(&key))
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_flags_survive_redefinition() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(vec![Column::new("age").hideable(true)], None);
    states.set_visible("age", false).unwrap();

    states.set_columns(
        vec![Column::new("age").with_name("Age (years)").hideable(true)],
        None,
    );
    assert!(!states.is_visible("age"));
    assert_eq!(
        states.get("age").unwrap().column.name.as_deref(),
        Some("Age (years)")
    );
}

#[test]
fn test_observers_receive_visibility() {
    let states: ColumnStates<Data> = ColumnStates::new();
    states.set_columns(vec![Column::new("a").hideable(true)], None);

    let last = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&last);
    states.subscribe(move |change| {
        if let ColumnChange::Visibility { visible } = change {
            *sink.lock().unwrap() = Some(visible.clone());
        }
    });

    states.set_visible("a", false).unwrap();
    assert_eq!(*last.lock().unwrap(), Some(Vec::<String>::new()));
}

#[test]
fn test_unknown_column_is_an_error() {
    let states: ColumnStates<Data> = ColumnStates::new();
    assert!(matches!(
        states.set_visible("ghost", true),
        Err(GridError::MissingColumnState(id)) if id == "ghost"
    ));
}
