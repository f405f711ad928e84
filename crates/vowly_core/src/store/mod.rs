//! Remote collection store contract.
//!
//! # Responsibility
//! - Define the transport-agnostic contract the sync layer consumes:
//!   live full-snapshot subscriptions plus create/update/delete writes.
//! - Validate typed records at the collaborator boundary.
//!
//! # Invariants
//! - A subscription delivers the full current snapshot immediately and after
//!   every store change for its `(user, kind)`, never a diff.
//! - A cancelled subscription receives no further deliveries.
//! - Deleting an absent record id is a no-op, not an error.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::db::DbError;
use crate::model::budget::Budget;
use crate::model::expense::Expense;
use crate::model::note::Note;
use crate::model::task::Task;
use crate::model::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Document id of the per-user budget singleton.
pub const BUDGET_DOC_ID: &str = "current";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store and subscription errors surfaced to callers.
#[derive(Debug)]
pub enum StoreError {
    /// Session has no usable user id.
    NotAuthenticated,
    /// Record failed boundary validation and was rejected before any write.
    InvalidData(String),
    /// Update target does not exist remotely.
    NotFound { kind: EntityKind, id: RecordId },
    /// Underlying local database failure.
    Db(DbError),
    /// Backend transport is unavailable; recoverable, surfaced via `on_error`.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "user not authenticated"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} record not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// The four synced collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Expenses,
    Tasks,
    Notes,
    Budget,
}

impl EntityKind {
    /// Stable collection name used in paths and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expenses => "expenses",
            Self::Tasks => "tasks",
            Self::Notes => "notes",
            Self::Budget => "budget",
        }
    }

    /// Parses a collection name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expenses" => Some(Self::Expenses),
            "tasks" => Some(Self::Tasks),
            "notes" => Some(Self::Notes),
            "budget" => Some(Self::Budget),
            _ => None,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session authentication context, injected explicitly instead of an
/// ambient current-user lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: String,
}

impl SessionContext {
    /// Creates a context for an authenticated user.
    ///
    /// # Errors
    /// - `StoreError::NotAuthenticated` when the user id is blank.
    pub fn new(user_id: impl Into<String>) -> StoreResult<Self> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(StoreError::NotAuthenticated);
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Tagged payload for a single write.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    Expense(Expense),
    Task(Task),
    Note(Note),
    Budget(Budget),
}

impl RecordData {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Expense(_) => EntityKind::Expenses,
            Self::Task(_) => EntityKind::Tasks,
            Self::Note(_) => EntityKind::Notes,
            Self::Budget(_) => EntityKind::Budget,
        }
    }

    /// Boundary validation applied before any write reaches storage.
    pub fn validate(&self) -> StoreResult<()> {
        let result = match self {
            Self::Expense(expense) => expense.validate().map_err(|err| err.to_string()),
            Self::Task(task) => task.validate().map_err(|err| err.to_string()),
            Self::Note(note) => note.validate().map_err(|err| err.to_string()),
            Self::Budget(budget) => budget.validate().map_err(|err| err.to_string()),
        };
        result.map_err(StoreError::InvalidData)
    }
}

/// Full, non-incremental contents of one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Expenses(Vec<Expense>),
    Tasks(Vec<Task>),
    Notes(Vec<Note>),
    Budget(Budget),
}

impl Snapshot {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Expenses(_) => EntityKind::Expenses,
            Self::Tasks(_) => EntityKind::Tasks,
            Self::Notes(_) => EntityKind::Notes,
            Self::Budget(_) => EntityKind::Budget,
        }
    }
}

/// Snapshot delivery callback.
pub type SnapshotFn = Box<dyn FnMut(Snapshot) + Send>;
/// Recoverable subscription-failure callback.
pub type ErrorFn = Box<dyn FnMut(StoreError) + Send>;

/// Cancellation handle for one live subscription.
///
/// Cancelling (or dropping) the handle flips the shared liveness flag; the
/// store checks that flag immediately before every delivery, so a consumer
/// that unsubscribed never observes another snapshot.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    alive: Arc<AtomicBool>,
}

impl Subscription {
    /// Builds a handle around a shared liveness flag. Store implementations
    /// keep a clone of `alive` and check it before every delivery.
    pub fn new(id: Uuid, alive: Arc<AtomicBool>) -> Self {
        Self { id, alive }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Stops all further deliveries for this subscription.
    pub fn cancel(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Remote collection stream collaborator.
///
/// Implementations must provide "exactly the latest full snapshot,
/// eventually" semantics: every successful mutation is followed by a fresh
/// snapshot delivery to each live matching subscription.
pub trait RemoteStore: Send + Sync {
    /// Opens a live subscription for one `(user, kind)` collection.
    ///
    /// The current snapshot is delivered before this call returns.
    fn subscribe(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        on_snapshot: SnapshotFn,
        on_error: ErrorFn,
    ) -> StoreResult<Subscription>;

    /// Creates (`id = None`, store assigns the id) or updates (`Some`) one
    /// record. Budget writes are upserts of the singleton document.
    fn write(
        &self,
        ctx: &SessionContext,
        id: Option<&str>,
        data: RecordData,
    ) -> StoreResult<RecordId>;

    /// Deletes one record. Absent ids are tolerated as a no-op.
    fn delete(&self, ctx: &SessionContext, kind: EntityKind, id: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, SessionContext, StoreError};

    #[test]
    fn entity_kind_names_roundtrip() {
        for kind in [
            EntityKind::Expenses,
            EntityKind::Tasks,
            EntityKind::Notes,
            EntityKind::Budget,
        ] {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("guests"), None);
    }

    #[test]
    fn session_context_rejects_blank_user() {
        assert!(matches!(
            SessionContext::new("   "),
            Err(StoreError::NotAuthenticated)
        ));
        let ctx = SessionContext::new("  uid-1  ").expect("trimmed id should be accepted");
        assert_eq!(ctx.user_id(), "uid-1");
    }
}
