//! Optimistic mutation behavior against a scripted in-memory backend.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use vowly_core::model::budget::Budget;
use vowly_core::model::expense::{Expense, ExpenseCategory};
use vowly_core::service::budget_service::BudgetPlanner;
use vowly_core::store::{
    EntityKind, ErrorFn, RecordData, RemoteStore, SessionContext, Snapshot, SnapshotFn,
    StoreError, StoreResult, Subscription, BUDGET_DOC_ID,
};
use vowly_core::sync::{is_placeholder_id, LiveCollection, MutationKind};

struct ScriptedSubscriber {
    kind: EntityKind,
    alive: Arc<AtomicBool>,
    on_snapshot: SnapshotFn,
    on_error: ErrorFn,
}

/// In-memory expense/budget backend whose failures can be scripted.
#[derive(Default)]
struct ScriptedStore {
    expenses: Mutex<Vec<Expense>>,
    budget: Mutex<Option<Budget>>,
    fail_next: AtomicBool,
    fail_budget_writes: AtomicBool,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<ScriptedSubscriber>>,
}

impl ScriptedStore {
    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Makes budget-document writes fail while everything else succeeds.
    fn fail_budget_writes(&self) {
        self.fail_budget_writes.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> StoreResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("scripted outage".to_string()));
        }
        Ok(())
    }

    /// Simulates a remote snapshot arriving, e.g. from another device.
    fn push_snapshot(&self, expenses: Vec<Expense>) {
        *self.expenses.lock().unwrap() = expenses;
        self.fan_out(EntityKind::Expenses);
    }

    /// Simulates a recoverable stream failure.
    fn push_error(&self) {
        let mut subscribers = self.subscribers.lock().unwrap();
        for entry in subscribers.iter_mut() {
            if entry.alive.load(Ordering::SeqCst) {
                (entry.on_error)(StoreError::Unavailable(
                    "scripted stream drop".to_string(),
                ));
            }
        }
    }

    fn snapshot_for(&self, kind: EntityKind) -> Snapshot {
        match kind {
            EntityKind::Budget => {
                Snapshot::Budget(self.budget.lock().unwrap().clone().unwrap_or_default())
            }
            _ => Snapshot::Expenses(self.expenses.lock().unwrap().clone()),
        }
    }

    fn fan_out(&self, kind: EntityKind) {
        let snapshot = self.snapshot_for(kind);
        let mut subscribers = self.subscribers.lock().unwrap();
        for entry in subscribers.iter_mut() {
            if entry.kind == kind && entry.alive.load(Ordering::SeqCst) {
                (entry.on_snapshot)(snapshot.clone());
            }
        }
    }
}

impl RemoteStore for ScriptedStore {
    fn subscribe(
        &self,
        _ctx: &SessionContext,
        kind: EntityKind,
        mut on_snapshot: SnapshotFn,
        on_error: ErrorFn,
    ) -> StoreResult<Subscription> {
        on_snapshot(self.snapshot_for(kind));
        let alive = Arc::new(AtomicBool::new(true));
        self.subscribers.lock().unwrap().push(ScriptedSubscriber {
            kind,
            alive: Arc::clone(&alive),
            on_snapshot,
            on_error,
        });
        Ok(Subscription::new(Uuid::new_v4(), alive))
    }

    fn write(
        &self,
        _ctx: &SessionContext,
        id: Option<&str>,
        data: RecordData,
    ) -> StoreResult<String> {
        self.take_failure()?;
        let mut expense = match data {
            RecordData::Expense(expense) => expense,
            RecordData::Budget(budget) => {
                if self.fail_budget_writes.load(Ordering::SeqCst) {
                    return Err(StoreError::Unavailable(
                        "scripted budget outage".to_string(),
                    ));
                }
                *self.budget.lock().unwrap() = Some(budget);
                self.fan_out(EntityKind::Budget);
                return Ok(BUDGET_DOC_ID.to_string());
            }
            _ => return Err(StoreError::InvalidData("unsupported kind".to_string())),
        };
        let assigned = match id {
            None => {
                let assigned = format!("r{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                expense.id = assigned.clone();
                self.expenses.lock().unwrap().push(expense);
                assigned
            }
            Some(id) => {
                let mut expenses = self.expenses.lock().unwrap();
                let slot = expenses
                    .iter_mut()
                    .find(|existing| existing.id == id)
                    .ok_or_else(|| StoreError::NotFound {
                        kind: EntityKind::Expenses,
                        id: id.to_string(),
                    })?;
                expense.id = id.to_string();
                *slot = expense;
                id.to_string()
            }
        };
        self.fan_out(EntityKind::Expenses);
        Ok(assigned)
    }

    fn delete(&self, _ctx: &SessionContext, _kind: EntityKind, id: &str) -> StoreResult<()> {
        self.take_failure()?;
        self.expenses.lock().unwrap().retain(|record| record.id != id);
        self.fan_out(EntityKind::Expenses);
        Ok(())
    }
}

fn expense(id: &str, description: &str, amount: f64) -> Expense {
    let mut expense = Expense::new(description, amount, ExpenseCategory::Other);
    expense.id = id.to_string();
    expense.date = 1_700_000_000_000;
    expense
}

fn open_collection(store: &Arc<ScriptedStore>) -> LiveCollection<Expense> {
    let ctx = SessionContext::new("uid-sync").unwrap();
    LiveCollection::open(Arc::clone(store) as Arc<dyn RemoteStore>, ctx).unwrap()
}

#[test]
fn failed_create_restores_exact_pre_insert_state() {
    let store = Arc::new(ScriptedStore::default());
    store.push_snapshot(vec![expense("r-seed", "venue deposit", 500.0)]);
    let collection = open_collection(&store);
    let before = collection.records();

    store.fail_next();
    let err = collection
        .insert(expense("", "cake tasting", 75.0))
        .unwrap_err();
    assert_eq!(err.mutation, MutationKind::Create);
    assert!(matches!(err.source, StoreError::Unavailable(_)));
    assert_eq!(collection.records(), before);
}

#[test]
fn failed_update_restores_exact_pre_update_state() {
    let store = Arc::new(ScriptedStore::default());
    store.push_snapshot(vec![expense("r-seed", "venue deposit", 500.0)]);
    let collection = open_collection(&store);
    let before = collection.records();

    store.fail_next();
    let err = collection
        .update(expense("r-seed", "venue deposit", 9_999.0))
        .unwrap_err();
    assert_eq!(err.mutation, MutationKind::Update);
    assert_eq!(collection.records(), before);
}

#[test]
fn failed_delete_restores_exact_pre_delete_state() {
    let store = Arc::new(ScriptedStore::default());
    store.push_snapshot(vec![expense("r-seed", "venue deposit", 500.0)]);
    let collection = open_collection(&store);
    let before = collection.records();

    store.fail_next();
    let err = collection.remove("r-seed").unwrap_err();
    assert_eq!(err.mutation, MutationKind::Delete);
    assert_eq!(collection.records(), before);
}

#[test]
fn successful_insert_replaces_placeholder_with_store_id() {
    let store = Arc::new(ScriptedStore::default());
    let collection = open_collection(&store);

    let assigned = collection
        .insert(expense("", "band deposit", 300.0))
        .unwrap();
    assert!(!is_placeholder_id(&assigned));

    // The write's own snapshot already superseded the placeholder.
    let records = collection.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, assigned);
}

#[test]
fn snapshot_replaces_mirror_wholesale() {
    let store = Arc::new(ScriptedStore::default());
    let collection = open_collection(&store);
    collection.insert(expense("", "florist", 120.0)).unwrap();

    let replacement = vec![
        expense("r-a", "photographer", 1_200.0),
        expense("r-b", "catering", 3_000.0),
    ];
    store.push_snapshot(replacement.clone());

    // No merging: the mirror is exactly the snapshot contents.
    assert_eq!(collection.records(), replacement);
}

#[test]
fn cancelled_collection_ignores_later_snapshots() {
    let store = Arc::new(ScriptedStore::default());
    let collection = open_collection(&store);
    collection.subscription().cancel();

    store.push_snapshot(vec![expense("r-late", "late arrival", 40.0)]);
    assert!(collection.is_empty());
}

#[test]
fn stream_error_is_surfaced_and_cleared_by_next_snapshot() {
    let store = Arc::new(ScriptedStore::default());
    let collection = open_collection(&store);
    assert_eq!(collection.stream_error(), None);

    store.push_error();
    let surfaced = collection.stream_error().expect("error should surface");
    assert!(surfaced.contains("scripted stream drop"));

    store.push_snapshot(Vec::new());
    assert_eq!(collection.stream_error(), None);
}

#[test]
fn failed_percentage_write_never_rolls_back_the_expense() {
    let store = Arc::new(ScriptedStore::default());
    let ctx = SessionContext::new("uid-percentage").unwrap();
    let planner =
        BudgetPlanner::open(Arc::clone(&store) as Arc<dyn RemoteStore>, ctx).unwrap();
    planner.set_budget(10_000.0).unwrap();

    store.fail_budget_writes();
    let id = planner
        .add_expense("venue deposit", 2_500.0, ExpenseCategory::Venue)
        .unwrap();

    // The primary mutation stands in the mirror and in the store.
    assert!(planner.expenses().iter().any(|expense| expense.id == id));
    assert!(store
        .expenses
        .lock()
        .unwrap()
        .iter()
        .any(|expense| expense.id == id));

    // Only the follow-up percentage write was lost.
    let stored = store.budget.lock().unwrap().clone().unwrap();
    assert_eq!(stored.amount, 10_000.0);
    assert_eq!(stored.percentage_spent, 0.0);
    assert_eq!(planner.total_spent(), 2_500.0);
}

#[test]
fn update_absent_from_mirror_is_still_written() {
    let store = Arc::new(ScriptedStore::default());
    store.push_snapshot(vec![expense("r-seed", "venue deposit", 500.0)]);
    let collection = open_collection(&store);

    let err = collection
        .update(expense("r-ghost", "phantom", 10.0))
        .unwrap_err();
    assert!(matches!(err.source, StoreError::NotFound { .. }));
    // Rollback left the seeded record untouched.
    assert_eq!(collection.len(), 1);
}
