use std::sync::{Arc, Mutex};
use vowly_core::model::budget::DEFAULT_BUDGET_AMOUNT;
use vowly_core::model::expense::{Expense, ExpenseCategory};
use vowly_core::store::{
    EntityKind, RecordData, RemoteStore, SessionContext, Snapshot, SqliteStore, StoreError,
};

fn collecting_sink() -> (
    Arc<Mutex<Vec<Snapshot>>>,
    Box<dyn FnMut(Snapshot) + Send>,
) {
    let seen: Arc<Mutex<Vec<Snapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let on_snapshot = Box::new(move |snapshot| sink.lock().unwrap().push(snapshot));
    (seen, on_snapshot)
}

fn ignore_errors() -> Box<dyn FnMut(StoreError) + Send> {
    Box::new(|_| {})
}

fn expense(description: &str, amount: f64) -> RecordData {
    let mut expense = Expense::new(description, amount, ExpenseCategory::Venue);
    expense.date = 1_700_000_000_000;
    RecordData::Expense(expense)
}

#[test]
fn subscribe_delivers_initial_snapshot_before_returning() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-initial").unwrap();
    store.write(&ctx, None, expense("venue deposit", 500.0)).unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let _sub = store
        .subscribe(&ctx, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Snapshot::Expenses(expenses) => {
            assert_eq!(expenses.len(), 1);
            assert_eq!(expenses[0].description, "venue deposit");
        }
        other => panic!("unexpected snapshot kind: {:?}", other.kind()),
    }
}

#[test]
fn budget_snapshot_defaults_when_document_absent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-budget-default").unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let _sub = store
        .subscribe(&ctx, EntityKind::Budget, on_snapshot, ignore_errors())
        .unwrap();

    let seen = seen.lock().unwrap();
    match &seen[0] {
        Snapshot::Budget(budget) => {
            assert_eq!(budget.amount, DEFAULT_BUDGET_AMOUNT);
            assert_eq!(budget.percentage_spent, 0.0);
        }
        other => panic!("unexpected snapshot kind: {:?}", other.kind()),
    }
}

#[test]
fn snapshots_are_scoped_to_the_subscribing_user() {
    let store = SqliteStore::open_in_memory().unwrap();
    let alice = SessionContext::new("uid-alice").unwrap();
    let bob = SessionContext::new("uid-bob").unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let _sub = store
        .subscribe(&alice, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();

    store.write(&bob, None, expense("tux rental", 300.0)).unwrap();

    let seen = seen.lock().unwrap();
    // Only the initial empty snapshot; another user's write must not fan out.
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Snapshot::Expenses(expenses) => assert!(expenses.is_empty()),
        other => panic!("unexpected snapshot kind: {:?}", other.kind()),
    }
}

#[test]
fn cancelled_subscription_receives_no_further_deliveries() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-cancel").unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let sub = store
        .subscribe(&ctx, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();
    assert!(sub.is_active());

    sub.cancel();
    assert!(!sub.is_active());

    store.write(&ctx, None, expense("flowers", 120.0)).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn dropping_the_handle_cancels_the_subscription() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-drop").unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let sub = store
        .subscribe(&ctx, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();
    drop(sub);

    store.write(&ctx, None, expense("band", 900.0)).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn every_write_fans_out_a_fresh_full_snapshot() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-fanout").unwrap();

    let (seen, on_snapshot) = collecting_sink();
    let _sub = store
        .subscribe(&ctx, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();

    store.write(&ctx, None, expense("cake", 250.0)).unwrap();
    store.write(&ctx, None, expense("invites", 80.0)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    match &seen[2] {
        Snapshot::Expenses(expenses) => assert_eq!(expenses.len(), 2),
        other => panic!("unexpected snapshot kind: {:?}", other.kind()),
    }
}

#[test]
fn update_of_absent_id_is_a_typed_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-missing").unwrap();

    let err = store
        .write(&ctx, Some("no-such-id"), expense("ghost", 10.0))
        .unwrap_err();
    match err {
        StoreError::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Expenses);
            assert_eq!(id, "no-such-id");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn delete_of_absent_id_is_a_no_op() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-absent-delete").unwrap();

    store
        .delete(&ctx, EntityKind::Expenses, "never-existed")
        .unwrap();
}

#[test]
fn invalid_record_is_rejected_before_any_write() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ctx = SessionContext::new("uid-invalid").unwrap();

    let err = store
        .write(&ctx, None, expense("free venue", 0.0))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));

    let (seen, on_snapshot) = collecting_sink();
    let _sub = store
        .subscribe(&ctx, EntityKind::Expenses, on_snapshot, ignore_errors())
        .unwrap();
    let seen = seen.lock().unwrap();
    match &seen[0] {
        Snapshot::Expenses(expenses) => assert!(expenses.is_empty()),
        other => panic!("unexpected snapshot kind: {:?}", other.kind()),
    }
}
