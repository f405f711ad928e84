//! Core domain logic for Vowly.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod sync;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::budget::{percentage_spent, Budget, DEFAULT_BUDGET_AMOUNT};
pub use model::expense::{Expense, ExpenseCategory, EXPENSE_CATEGORIES};
pub use model::note::{Note, NoteColor, NoteEmoji, NOTE_COLORS, NOTE_EMOJIS};
pub use model::task::{Task, DEFAULT_TASK_CATEGORY, TASK_CATEGORIES};
pub use model::RecordId;
pub use service::budget_service::{BudgetError, BudgetPlanner, BudgetSummary, CategoryTotal};
pub use service::note_service::{NoteError, Notebook};
pub use service::task_service::{TaskBoard, TaskError};
pub use store::{
    EntityKind, RecordData, RemoteStore, SessionContext, Snapshot, SqliteStore, StoreError,
    StoreResult, Subscription,
};
pub use sync::{is_placeholder_id, LiveCollection, MutationError, MutationKind};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
