//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Return values are UTF-8 strings with stable meaning.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use vowly_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BudgetPlanner, Expense, ExpenseCategory, Note, NoteColor, NoteEmoji, Notebook, RemoteStore,
    SessionContext, SqliteStore, Task, TaskBoard,
};

const DB_FILE_NAME: &str = "vowly.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for command flows.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional created record ID.
    pub record_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// One expense row for list display.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseItem {
    pub id: String,
    pub description: String,
    pub amount: f64,
    /// Stored category label (`Venue|Catering|Attire|Photography|Other`).
    pub category: String,
    pub date: i64,
}

/// Expense list envelope; a failed query is distinguishable from an
/// empty collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseListResponse {
    /// Whether the query succeeded.
    pub ok: bool,
    /// Result rows (empty on failure).
    pub items: Vec<ExpenseItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// One checklist row for list display.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub category: String,
    pub deadline: Option<i64>,
    pub created_at: i64,
}

/// Checklist list envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// One sticky-note row for list display.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub text: String,
    /// Palette hex string, e.g. `#4ECDC4`.
    pub color: String,
    pub emoji: String,
    pub created_at: i64,
}

/// Sticky-note list envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteItem>,
    pub message: String,
}

/// Budget headline numbers for the overview card.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummaryResponse {
    pub ok: bool,
    pub budget_amount: f64,
    pub total_spent: f64,
    pub remaining: f64,
    /// `$xyz.ab`, suffixed with ` (Over)` when spending exceeds the budget.
    pub remaining_label: String,
    pub percentage_spent: f64,
    pub over_budget: bool,
    pub message: String,
}

/// Returns the budget overview for one user.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` carries the failure message, numbers zeroed.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_summary(user_id: String) -> BudgetSummaryResponse {
    match with_planner(&user_id, |planner| Ok(planner.summary())) {
        Ok(summary) => BudgetSummaryResponse {
            ok: true,
            budget_amount: summary.budget_amount,
            total_spent: summary.total_spent,
            remaining: summary.remaining,
            remaining_label: summary.remaining_label(),
            percentage_spent: summary.percentage_spent,
            over_budget: summary.over_budget,
            message: String::new(),
        },
        Err(err) => BudgetSummaryResponse {
            ok: false,
            budget_amount: 0.0,
            total_spent: 0.0,
            remaining: 0.0,
            remaining_label: String::new(),
            percentage_spent: 0.0,
            over_budget: false,
            message: format!("budget_summary failed: {err}"),
        },
    }
}

/// Sets the total budget amount for one user.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_set_amount(user_id: String, amount: f64) -> ActionResponse {
    match with_planner(&user_id, |planner| {
        planner.set_budget(amount).map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Budget updated.", None),
        Err(err) => ActionResponse::failure(format!("budget_set_amount failed: {err}")),
    }
}

/// Records an expense; amount must be positive, category one of the stored
/// labels.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_add_expense(
    user_id: String,
    description: String,
    amount: f64,
    category: String,
) -> ActionResponse {
    let category = match parse_category(&category) {
        Ok(category) => category,
        Err(err) => return ActionResponse::failure(format!("budget_add_expense failed: {err}")),
    };
    match with_planner(&user_id, |planner| {
        planner
            .add_expense(description.trim(), amount, category)
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => ActionResponse::success("Expense added.", Some(id)),
        Err(err) => ActionResponse::failure(format!("budget_add_expense failed: {err}")),
    }
}

/// Rewrites an existing expense in place.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_edit_expense(
    user_id: String,
    id: String,
    description: String,
    amount: f64,
    category: String,
) -> ActionResponse {
    let category = match parse_category(&category) {
        Ok(category) => category,
        Err(err) => return ActionResponse::failure(format!("budget_edit_expense failed: {err}")),
    };
    match with_planner(&user_id, |planner| {
        planner
            .edit_expense(&id, description.trim(), amount, category)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Expense updated.", Some(id)),
        Err(err) => ActionResponse::failure(format!("budget_edit_expense failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn budget_delete_expense(user_id: String, id: String) -> ActionResponse {
    match with_planner(&user_id, |planner| {
        planner.delete_expense(&id).map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Expense deleted.", None),
        Err(err) => ActionResponse::failure(format!("budget_delete_expense failed: {err}")),
    }
}

/// Lists expenses newest-first; `limit=None` returns all of them.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` carries the failure message, items empty.
#[flutter_rust_bridge::frb(sync)]
pub fn expense_list(user_id: String, limit: Option<u32>) -> ExpenseListResponse {
    let result = with_planner(&user_id, |planner| {
        let expenses = match limit {
            Some(limit) => planner.recent_expenses(limit as usize),
            None => planner.recent_expenses(usize::MAX),
        };
        Ok(expenses.into_iter().map(to_expense_item).collect())
    });
    match result {
        Ok(items) => ExpenseListResponse {
            ok: true,
            items,
            message: String::new(),
        },
        Err(err) => ExpenseListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("expense_list failed: {err}"),
        },
    }
}

/// Adds an uncompleted task; blank category falls back to `General`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(
    user_id: String,
    text: String,
    category: Option<String>,
    deadline: Option<i64>,
) -> ActionResponse {
    match with_board(&user_id, |board| {
        board
            .add_task(text.trim(), category.as_deref(), deadline)
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => ActionResponse::success("Task added.", Some(id)),
        Err(err) => ActionResponse::failure(format!("task_add failed: {err}")),
    }
}

/// Flips one task's completion flag.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(user_id: String, id: String) -> ActionResponse {
    match with_board(&user_id, |board| {
        board.toggle_task(&id).map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Task toggled.", Some(id)),
        Err(err) => ActionResponse::failure(format!("task_toggle failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(user_id: String, id: String) -> ActionResponse {
    match with_board(&user_id, |board| {
        board.delete_task(&id).map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Task deleted.", None),
        Err(err) => ActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Lists tasks, optionally filtered to one category.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` carries the failure message, items empty.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(user_id: String, category: Option<String>) -> TaskListResponse {
    let result = with_board(&user_id, |board| {
        Ok(board
            .tasks_in_category(category.as_deref())
            .into_iter()
            .map(to_task_item)
            .collect())
    });
    match result {
        Ok(items) => TaskListResponse {
            ok: true,
            items,
            message: String::new(),
        },
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

/// Creates a sticky note; blank titles become `Untitled`, color and emoji
/// must come from the fixed palette.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add(
    user_id: String,
    title: String,
    text: String,
    color: String,
    emoji: String,
) -> ActionResponse {
    let color = match NoteColor::parse(&color) {
        Some(color) => color,
        None => return ActionResponse::failure(format!("note_add failed: unknown color `{color}`")),
    };
    let emoji = match NoteEmoji::parse(&emoji) {
        Some(emoji) => emoji,
        None => return ActionResponse::failure(format!("note_add failed: unknown emoji `{emoji}`")),
    };
    match with_notebook(&user_id, |notebook| {
        notebook
            .add_note(title, text, color, emoji)
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => ActionResponse::success("Note added.", Some(id)),
        Err(err) => ActionResponse::failure(format!("note_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(user_id: String, id: String) -> ActionResponse {
    match with_notebook(&user_id, |notebook| {
        notebook.delete_note(&id).map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Note deleted.", None),
        Err(err) => ActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

/// Lists all notes for one user.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` carries the failure message, items empty.
#[flutter_rust_bridge::frb(sync)]
pub fn note_list(user_id: String) -> NoteListResponse {
    let result = with_notebook(&user_id, |notebook| {
        Ok(notebook.notes().into_iter().map(to_note_item).collect())
    });
    match result {
        Ok(items) => NoteListResponse {
            ok: true,
            items,
            message: String::new(),
        },
        Err(err) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("note_list failed: {err}"),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("VOWLY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_session(user_id: &str) -> Result<(Arc<dyn RemoteStore>, SessionContext), String> {
    let store =
        SqliteStore::open(resolve_db_path()).map_err(|err| format!("store open failed: {err}"))?;
    let ctx = SessionContext::new(user_id).map_err(|err| err.to_string())?;
    Ok((Arc::new(store), ctx))
}

fn with_planner<T>(
    user_id: &str,
    f: impl FnOnce(&BudgetPlanner) -> Result<T, String>,
) -> Result<T, String> {
    let (store, ctx) = open_session(user_id)?;
    let planner = BudgetPlanner::open(store, ctx).map_err(|err| err.to_string())?;
    f(&planner)
}

fn with_board<T>(
    user_id: &str,
    f: impl FnOnce(&TaskBoard) -> Result<T, String>,
) -> Result<T, String> {
    let (store, ctx) = open_session(user_id)?;
    let board = TaskBoard::open(store, ctx).map_err(|err| err.to_string())?;
    f(&board)
}

fn with_notebook<T>(
    user_id: &str,
    f: impl FnOnce(&Notebook) -> Result<T, String>,
) -> Result<T, String> {
    let (store, ctx) = open_session(user_id)?;
    let notebook = Notebook::open(store, ctx).map_err(|err| err.to_string())?;
    f(&notebook)
}

fn parse_category(label: &str) -> Result<ExpenseCategory, String> {
    ExpenseCategory::parse(label).ok_or_else(|| format!("unknown category `{label}`"))
}

fn to_expense_item(expense: Expense) -> ExpenseItem {
    ExpenseItem {
        id: expense.id,
        description: expense.description,
        amount: expense.amount,
        category: expense.category.to_string(),
        date: expense.date,
    }
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        id: task.id,
        text: task.text,
        completed: task.completed,
        category: task.category,
        deadline: task.deadline,
        created_at: task.created_at,
    }
}

fn to_note_item(note: Note) -> NoteItem {
    NoteItem {
        id: note.id,
        title: note.title,
        text: note.text,
        color: note.color.hex().to_string(),
        emoji: note.emoji.glyph().to_string(),
        created_at: note.created_at,
    }
}
