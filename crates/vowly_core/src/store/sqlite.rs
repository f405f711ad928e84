//! SQLite-backed implementation of the remote collection store.
//!
//! # Responsibility
//! - Persist the four collections in per-user scoped tables.
//! - Push a fresh full snapshot to every live matching subscription after
//!   each successful mutation.
//!
//! # Invariants
//! - Snapshot callbacks must not call back into the store.
//! - Row parsing rejects invalid persisted state instead of masking it.
//! - A missing budget row yields the default document, never an error.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::budget::Budget;
use crate::model::expense::{Expense, ExpenseCategory};
use crate::model::note::{Note, NoteColor, NoteEmoji};
use crate::model::task::Task;
use crate::model::RecordId;
use crate::store::{
    EntityKind, ErrorFn, RecordData, RemoteStore, SessionContext, Snapshot, SnapshotFn,
    StoreError, StoreResult, Subscription, BUDGET_DOC_ID,
};
use log::{debug, warn};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

struct Subscriber {
    id: Uuid,
    user_id: String,
    kind: EntityKind,
    alive: Arc<AtomicBool>,
    on_snapshot: SnapshotFn,
    on_error: ErrorFn,
}

/// In-process store backend used by the mobile shell and the tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SqliteStore {
    /// Opens a file-backed store with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a throwaway in-memory store, mainly for tests and local dev.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store connection mutex poisoned")
    }

    fn build_snapshot(&self, user_id: &str, kind: EntityKind) -> StoreResult<Snapshot> {
        let conn = self.lock_conn();
        match kind {
            EntityKind::Expenses => Ok(Snapshot::Expenses(load_expenses(&conn, user_id)?)),
            EntityKind::Tasks => Ok(Snapshot::Tasks(load_tasks(&conn, user_id)?)),
            EntityKind::Notes => Ok(Snapshot::Notes(load_notes(&conn, user_id)?)),
            EntityKind::Budget => Ok(Snapshot::Budget(load_budget(&conn, user_id)?)),
        }
    }

    /// Re-queries one collection and delivers it to every live matching
    /// subscription. Dead entries are pruned on the way. A failed re-query
    /// is a subscription-level condition: it reaches consumers through
    /// `on_error`, not through the mutating caller.
    fn dispatch(&self, user_id: &str, kind: EntityKind) {
        let snapshot = self.build_snapshot(user_id, kind);
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry mutex poisoned");
        subscribers.retain(|entry| {
            let live = entry.alive.load(Ordering::SeqCst);
            if !live {
                debug!(
                    "event=subscription_pruned module=store kind={} subscription={}",
                    entry.kind, entry.id
                );
            }
            live
        });

        let mut delivered = 0_usize;
        for entry in subscribers.iter_mut() {
            if entry.user_id != user_id || entry.kind != kind {
                continue;
            }
            // Liveness is re-checked right before delivery so a consumer that
            // cancelled mid-dispatch is skipped.
            if !entry.alive.load(Ordering::SeqCst) {
                continue;
            }
            match &snapshot {
                Ok(snapshot) => (entry.on_snapshot)(snapshot.clone()),
                Err(err) => (entry.on_error)(StoreError::Unavailable(err.to_string())),
            }
            delivered += 1;
        }

        if let Err(err) = &snapshot {
            warn!("event=snapshot_dispatch module=store status=error kind={kind} error={err}");
        } else {
            debug!("event=snapshot_dispatch module=store kind={kind} subscribers={delivered}");
        }
    }
}

impl RemoteStore for SqliteStore {
    fn subscribe(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        on_snapshot: SnapshotFn,
        on_error: ErrorFn,
    ) -> StoreResult<Subscription> {
        let snapshot = self.build_snapshot(ctx.user_id(), kind)?;
        let alive = Arc::new(AtomicBool::new(true));
        let id = Uuid::new_v4();
        let mut entry = Subscriber {
            id,
            user_id: ctx.user_id().to_string(),
            kind,
            alive: Arc::clone(&alive),
            on_snapshot,
            on_error,
        };

        // Initial snapshot is delivered before the handle is returned.
        (entry.on_snapshot)(snapshot);

        self.subscribers
            .lock()
            .expect("subscriber registry mutex poisoned")
            .push(entry);
        debug!(
            "event=subscribe module=store kind={kind} subscription={id}"
        );
        Ok(Subscription::new(id, alive))
    }

    fn write(
        &self,
        ctx: &SessionContext,
        id: Option<&str>,
        data: RecordData,
    ) -> StoreResult<RecordId> {
        data.validate()?;
        let kind = data.kind();
        let user_id = ctx.user_id();

        let record_id = {
            let conn = self.lock_conn();
            match data {
                RecordData::Expense(expense) => write_expense(&conn, user_id, id, &expense)?,
                RecordData::Task(task) => write_task(&conn, user_id, id, &task)?,
                RecordData::Note(note) => write_note(&conn, user_id, id, &note)?,
                RecordData::Budget(budget) => write_budget(&conn, user_id, &budget)?,
            }
        };

        self.dispatch(user_id, kind);
        Ok(record_id)
    }

    fn delete(&self, ctx: &SessionContext, kind: EntityKind, id: &str) -> StoreResult<()> {
        let user_id = ctx.user_id();
        let changed = {
            let conn = self.lock_conn();
            match kind {
                EntityKind::Expenses => conn.execute(
                    "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2;",
                    params![id, user_id],
                )?,
                EntityKind::Tasks => conn.execute(
                    "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2;",
                    params![id, user_id],
                )?,
                EntityKind::Notes => conn.execute(
                    "DELETE FROM notes WHERE id = ?1 AND user_id = ?2;",
                    params![id, user_id],
                )?,
                EntityKind::Budget => conn.execute(
                    "DELETE FROM budget WHERE user_id = ?1;",
                    params![user_id],
                )?,
            }
        };

        if changed == 0 {
            // Tolerated: a snapshot lacking the record may have raced ahead
            // of the delete.
            warn!("event=delete_absent module=store kind={kind} id={id}");
            return Ok(());
        }

        self.dispatch(user_id, kind);
        Ok(())
    }
}

fn new_remote_id() -> RecordId {
    Uuid::new_v4().simple().to_string()
}

fn write_expense(
    conn: &Connection,
    user_id: &str,
    id: Option<&str>,
    expense: &Expense,
) -> StoreResult<RecordId> {
    match id {
        None => {
            let record_id = new_remote_id();
            conn.execute(
                "INSERT INTO expenses (id, user_id, description, amount, category, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    record_id,
                    user_id,
                    expense.description.as_str(),
                    expense.amount,
                    expense.category.as_str(),
                    expense.date,
                ],
            )?;
            Ok(record_id)
        }
        Some(record_id) => {
            let changed = conn.execute(
                "UPDATE expenses
                 SET description = ?1, amount = ?2, category = ?3, date = ?4
                 WHERE id = ?5 AND user_id = ?6;",
                params![
                    expense.description.as_str(),
                    expense.amount,
                    expense.category.as_str(),
                    expense.date,
                    record_id,
                    user_id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Expenses,
                    id: record_id.to_string(),
                });
            }
            Ok(record_id.to_string())
        }
    }
}

fn write_task(
    conn: &Connection,
    user_id: &str,
    id: Option<&str>,
    task: &Task,
) -> StoreResult<RecordId> {
    match id {
        None => {
            let record_id = new_remote_id();
            conn.execute(
                "INSERT INTO tasks (id, user_id, text, completed, category, deadline, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    record_id,
                    user_id,
                    task.text.as_str(),
                    task.completed as i64,
                    task.category.as_str(),
                    task.deadline,
                    task.created_at,
                ],
            )?;
            Ok(record_id)
        }
        Some(record_id) => {
            let changed = conn.execute(
                "UPDATE tasks
                 SET text = ?1, completed = ?2, category = ?3, deadline = ?4, created_at = ?5
                 WHERE id = ?6 AND user_id = ?7;",
                params![
                    task.text.as_str(),
                    task.completed as i64,
                    task.category.as_str(),
                    task.deadline,
                    task.created_at,
                    record_id,
                    user_id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Tasks,
                    id: record_id.to_string(),
                });
            }
            Ok(record_id.to_string())
        }
    }
}

fn write_note(
    conn: &Connection,
    user_id: &str,
    id: Option<&str>,
    note: &Note,
) -> StoreResult<RecordId> {
    match id {
        None => {
            let record_id = new_remote_id();
            conn.execute(
                "INSERT INTO notes (id, user_id, title, text, color, emoji, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    record_id,
                    user_id,
                    note.title.as_str(),
                    note.text.as_str(),
                    note.color.hex(),
                    note.emoji.glyph(),
                    note.created_at,
                ],
            )?;
            Ok(record_id)
        }
        Some(record_id) => {
            let changed = conn.execute(
                "UPDATE notes
                 SET title = ?1, text = ?2, color = ?3, emoji = ?4, created_at = ?5
                 WHERE id = ?6 AND user_id = ?7;",
                params![
                    note.title.as_str(),
                    note.text.as_str(),
                    note.color.hex(),
                    note.emoji.glyph(),
                    note.created_at,
                    record_id,
                    user_id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Notes,
                    id: record_id.to_string(),
                });
            }
            Ok(record_id.to_string())
        }
    }
}

fn write_budget(conn: &Connection, user_id: &str, budget: &Budget) -> StoreResult<RecordId> {
    conn.execute(
        "INSERT INTO budget (user_id, amount, percentage_spent)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE
         SET amount = excluded.amount, percentage_spent = excluded.percentage_spent;",
        params![user_id, budget.amount, budget.percentage_spent],
    )?;
    Ok(BUDGET_DOC_ID.to_string())
}

fn load_expenses(conn: &Connection, user_id: &str) -> StoreResult<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, description, amount, category, date
         FROM expenses
         WHERE user_id = ?1
         ORDER BY date ASC, id ASC;",
    )?;
    let mut rows = stmt.query(params![user_id])?;
    let mut expenses = Vec::new();
    while let Some(row) = rows.next()? {
        expenses.push(parse_expense_row(row)?);
    }
    Ok(expenses)
}

fn load_tasks(conn: &Connection, user_id: &str) -> StoreResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, text, completed, category, deadline, created_at
         FROM tasks
         WHERE user_id = ?1
         ORDER BY created_at ASC, id ASC;",
    )?;
    let mut rows = stmt.query(params![user_id])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn load_notes(conn: &Connection, user_id: &str) -> StoreResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, text, color, emoji, created_at
         FROM notes
         WHERE user_id = ?1
         ORDER BY created_at ASC, id ASC;",
    )?;
    let mut rows = stmt.query(params![user_id])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(row)?);
    }
    Ok(notes)
}

fn load_budget(conn: &Connection, user_id: &str) -> StoreResult<Budget> {
    let mut stmt = conn.prepare(
        "SELECT amount, percentage_spent FROM budget WHERE user_id = ?1;",
    )?;
    let mut rows = stmt.query(params![user_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Budget {
            amount: row.get(0)?,
            percentage_spent: row.get(1)?,
        });
    }
    Ok(Budget::default())
}

fn parse_expense_row(row: &Row<'_>) -> StoreResult<Expense> {
    let category_text: String = row.get("category")?;
    let category = ExpenseCategory::parse(&category_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid category `{category_text}` in expenses.category"
        ))
    })?;
    Ok(Expense {
        id: row.get("id")?,
        description: row.get("description")?,
        amount: row.get("amount")?,
        category,
        date: row.get("date")?,
    })
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };
    Ok(Task {
        id: row.get("id")?,
        text: row.get("text")?,
        completed,
        category: row.get("category")?,
        deadline: row.get("deadline")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let color_text: String = row.get("color")?;
    let color = NoteColor::parse(&color_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid color `{color_text}` in notes.color"))
    })?;
    let emoji_text: String = row.get("emoji")?;
    let emoji = NoteEmoji::parse(&emoji_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid emoji `{emoji_text}` in notes.emoji"))
    })?;
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        color,
        emoji,
        created_at: row.get("created_at")?,
    })
}
