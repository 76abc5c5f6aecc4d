use std::sync::{Arc, Mutex};

use super::*;

type Commits = Arc<Mutex<Vec<Vec<Row>>>>;

fn order_columns() -> Vec<Column> {
    vec![Column::text("customer"), Column::number("qty"), Column::number("unit_price")]
}

fn order_rows() -> Vec<Row> {
    vec![
        Row::new(1).with("customer", "Acme").with("qty", 3).with("unit_price", 9.5),
        Row::new(2).with("customer", "Globex").with("qty", 10).with("unit_price", 1.25),
    ]
}

fn controller() -> (EditableTableController, Commits) {
    let commits: Commits = Arc::default();
    let sink = Arc::clone(&commits);
    let table = EditableTableController::new(order_columns(), order_rows(), move |rows: &[Row]| {
        sink.lock().unwrap().push(rows.to_vec());
    });
    (table, commits)
}

fn id(n: i64) -> RowId {
    RowId::Int(n)
}

// =============================================================================
// start_edit / is_editing
// =============================================================================

#[test]
fn start_edit_marks_only_that_cell() {
    let (mut table, _) = controller();
    assert!(table.start_edit(&id(1), "qty"));
    assert!(table.is_editing(&id(1), "qty"));
    assert!(!table.is_editing(&id(1), "customer"));
    assert!(!table.is_editing(&id(2), "qty"));
    assert_eq!(table.editing(), Some(&EditingCell { item_id: id(1), field: "qty".into() }));
}

#[test]
fn start_edit_missing_row_is_noop() {
    let (mut table, _) = controller();
    assert!(!table.start_edit(&id(99), "qty"));
    assert!(table.editing().is_none());
}

#[test]
fn start_edit_missing_row_keeps_existing_session() {
    let (mut table, _) = controller();
    table.start_edit(&id(2), "customer");
    assert!(!table.start_edit(&id(99), "qty"));
    assert!(table.is_editing(&id(2), "customer"));
}

#[test]
fn second_start_edit_replaces_session() {
    let (mut table, _) = controller();
    table.start_edit(&id(1), "qty");
    table.start_edit(&id(2), "qty");
    assert!(!table.is_editing(&id(1), "qty"));
    assert!(table.is_editing(&id(2), "qty"));
}

#[test]
fn editing_cleared_after_commit_and_cancel() {
    let (mut table, _) = controller();
    table.start_edit(&id(1), "qty");
    table.commit();
    assert!(!table.is_editing(&id(1), "qty"));

    table.start_edit(&id(1), "qty");
    table.cancel();
    assert!(!table.is_editing(&id(1), "qty"));
}

// =============================================================================
// set_value
// =============================================================================

#[test]
fn set_value_replaces_only_named_field() {
    let (mut table, _) = controller();
    assert!(table.set_value(&id(2), "customer", "Initech"));
    let row = table.row(&id(2)).unwrap();
    assert_eq!(row.get("customer"), Some(&FieldValue::from("Initech")));
    assert_eq!(row.get("qty"), Some(&FieldValue::Number(10.0)));
    assert_eq!(table.row(&id(1)).unwrap().get("customer"), Some(&FieldValue::from("Acme")));
}

#[test]
fn set_value_coerces_numeric_columns() {
    let (mut table, _) = controller();
    table.set_value(&id(1), "qty", "7");
    assert_eq!(table.row(&id(1)).unwrap().get("qty"), Some(&FieldValue::Number(7.0)));
    table.set_value(&id(1), "qty", "seven");
    assert_eq!(table.row(&id(1)).unwrap().get("qty"), Some(&FieldValue::Number(0.0)));
}

#[test]
fn set_value_undeclared_field_kept_as_given() {
    let (mut table, _) = controller();
    table.set_value(&id(1), "notes", "fragile");
    assert_eq!(table.row(&id(1)).unwrap().get("notes"), Some(&FieldValue::from("fragile")));
}

#[test]
fn set_value_without_active_edit_is_allowed() {
    let (mut table, commits) = controller();
    assert!(table.set_value(&id(1), "unit_price", 11.0));
    assert!(table.editing().is_none());
    assert!(commits.lock().unwrap().is_empty());
}

#[test]
fn set_value_missing_row_returns_false() {
    let (mut table, _) = controller();
    assert!(!table.set_value(&id(42), "qty", 1));
    assert_eq!(table.rows(), order_rows().as_slice());
}

// =============================================================================
// commit
// =============================================================================

#[test]
fn commit_notifies_once_with_full_rows() {
    let (mut table, commits) = controller();
    table.start_edit(&id(1), "qty");
    table.set_value(&id(1), "qty", "4");
    table.commit();

    let commits = commits.lock().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].len(), 2);
    assert_eq!(commits[0][0].get("qty"), Some(&FieldValue::Number(4.0)));
    assert_eq!(commits[0][1], order_rows()[1]);
}

#[test]
fn commit_without_edit_still_notifies() {
    let (mut table, commits) = controller();
    table.commit();
    table.commit();
    let commits = commits.lock().unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0], order_rows());
}

// =============================================================================
// cancel
// =============================================================================

#[test]
fn cancel_restores_pre_edit_value() {
    let (mut table, commits) = controller();
    let before = table.row(&id(1)).unwrap().get("unit_price").cloned();
    table.start_edit(&id(1), "unit_price");
    table.set_value(&id(1), "unit_price", "100");
    table.cancel();
    assert_eq!(table.row(&id(1)).unwrap().get("unit_price").cloned(), before);
    assert!(commits.lock().unwrap().is_empty());
}

#[test]
fn cancel_restores_value_even_when_kind_mismatched() {
    let rows = vec![Row::new(1).with("qty", "n/a")];
    let mut table = EditableTableController::new(order_columns(), rows, |_rows: &[Row]| {});
    table.start_edit(&id(1), "qty");
    table.set_value(&id(1), "qty", 5);
    table.cancel();
    assert_eq!(table.row(&id(1)).unwrap().get("qty"), Some(&FieldValue::from("n/a")));
}

#[test]
fn cancel_removes_field_that_did_not_exist() {
    let (mut table, _) = controller();
    table.start_edit(&id(2), "notes");
    table.set_value(&id(2), "notes", "call first");
    table.cancel();
    assert!(table.row(&id(2)).unwrap().get("notes").is_none());
}

#[test]
fn cancel_without_edit_is_noop() {
    let (mut table, commits) = controller();
    table.set_value(&id(1), "qty", 8);
    table.cancel();
    assert_eq!(table.row(&id(1)).unwrap().get("qty"), Some(&FieldValue::Number(8.0)));
    assert!(commits.lock().unwrap().is_empty());
}

// =============================================================================
// sync_rows
// =============================================================================

#[test]
fn sync_rows_replaces_copy_and_abandons_edit() {
    let (mut table, commits) = controller();
    table.start_edit(&id(1), "qty");
    table.set_value(&id(1), "qty", 99);

    let fresh = vec![Row::new(3).with("customer", "Umbrella").with("qty", 1)];
    table.sync_rows(fresh.clone());

    assert!(table.editing().is_none());
    assert_eq!(table.rows(), fresh.as_slice());
    assert!(commits.lock().unwrap().is_empty());

    // Escape after resync has nothing to restore.
    table.cancel();
    assert_eq!(table.rows(), fresh.as_slice());
}

// =============================================================================
// dispatch
// =============================================================================

#[test]
fn dispatch_double_click_input_enter() {
    let (mut table, commits) = controller();
    table.dispatch(CellEvent::DoubleClick { item_id: id(2), field: "customer".into() });
    table.dispatch(CellEvent::Input { item_id: id(2), field: "customer".into(), value: "Hooli".into() });
    table.dispatch(CellEvent::KeyDown(Key::Other));
    assert!(table.is_editing(&id(2), "customer"));

    table.dispatch(CellEvent::KeyDown(Key::Enter));
    assert!(table.editing().is_none());
    let commits = commits.lock().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0][1].get("customer"), Some(&FieldValue::from("Hooli")));
}

#[test]
fn dispatch_escape_reverts_and_blur_commits() {
    let (mut table, commits) = controller();
    table.dispatch(CellEvent::DoubleClick { item_id: id(1), field: "qty".into() });
    table.dispatch(CellEvent::Input { item_id: id(1), field: "qty".into(), value: "12".into() });
    table.dispatch(CellEvent::KeyDown(Key::Escape));
    assert_eq!(table.row(&id(1)).unwrap().get("qty"), Some(&FieldValue::Number(3.0)));
    assert!(commits.lock().unwrap().is_empty());

    table.dispatch(CellEvent::Blur);
    assert_eq!(commits.lock().unwrap().len(), 1);
}
