//! Checklist use-case service.
//!
//! # Responsibility
//! - Maintain the live task collection for one user.
//! - Provide add/toggle/delete operations with optimistic rollback.
//! - Derive category-filtered views and the completion ratio.

use crate::model::task::{Task, TaskValidationError};
use crate::model::{now_epoch_ms, RecordId};
use crate::store::{RemoteStore, SessionContext, StoreResult};
use crate::sync::{LiveCollection, MutationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Checklist use-case error.
#[derive(Debug)]
pub enum TaskError {
    /// Task failed validation; no state was touched.
    Invalid(TaskValidationError),
    /// Toggle target is not in the mirror.
    NotFound(RecordId),
    /// Remote write failed; local state was rolled back.
    Mutation(MutationError),
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Mutation(err) => Some(err),
        }
    }
}

impl From<MutationError> for TaskError {
    fn from(value: MutationError) -> Self {
        Self::Mutation(value)
    }
}

/// Checklist facade over the live task collection.
pub struct TaskBoard {
    tasks: LiveCollection<Task>,
}

impl TaskBoard {
    /// Opens the live subscription; the mirror holds current remote state
    /// when this returns.
    pub fn open(store: Arc<dyn RemoteStore>, ctx: SessionContext) -> StoreResult<Self> {
        Ok(Self {
            tasks: LiveCollection::open(store, ctx)?,
        })
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.records()
    }

    /// Tasks in one category; `None` means no filter ("All").
    pub fn tasks_in_category(&self, category: Option<&str>) -> Vec<Task> {
        let tasks = self.tasks.records();
        match category {
            None => tasks,
            Some(category) => tasks
                .into_iter()
                .filter(|task| task.category == category)
                .collect(),
        }
    }

    /// Percent of tasks completed; 0 for an empty checklist.
    pub fn completion_ratio(&self) -> f64 {
        let tasks = self.tasks.records();
        if tasks.is_empty() {
            return 0.0;
        }
        let done = tasks.iter().filter(|task| task.completed).count();
        done as f64 / tasks.len() as f64 * 100.0
    }

    /// Adds an uncompleted task, category defaulting to "General".
    pub fn add_task(
        &self,
        text: impl Into<String>,
        category: Option<&str>,
        deadline: Option<i64>,
    ) -> Result<RecordId, TaskError> {
        let mut task = Task::new(text, category, deadline);
        task.created_at = now_epoch_ms();
        task.validate().map_err(TaskError::Invalid)?;
        Ok(self.tasks.insert(task)?)
    }

    /// Flips one task's completion flag optimistically.
    pub fn toggle_task(&self, id: &str) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.completed = !task.completed;
        Ok(self.tasks.update(task)?)
    }

    pub fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        Ok(self.tasks.remove(id)?)
    }

    /// Last unrecovered stream failure, retained for a retry UI.
    pub fn stream_error(&self) -> Option<String> {
        self.tasks.stream_error()
    }

    pub fn clear_stream_error(&self) {
        self.tasks.clear_stream_error();
    }
}
