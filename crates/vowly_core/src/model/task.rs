//! Wedding checklist task record.
//!
//! # Responsibility
//! - Define the task document shape shared with the mobile checklist UI.
//! - Provide deadline helpers for countdown display.
//!
//! # Invariants
//! - `text` contains non-whitespace content.
//! - `completed` defaults to `false` on creation.
//! - `created_at` is stamped once, on write.

use crate::model::RecordId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Category applied when the caller does not pick one.
pub const DEFAULT_TASK_CATEGORY: &str = "General";

/// Category names offered by the checklist UI. Tasks keep a free-form
/// string so older documents with retired categories still load.
pub const TASK_CATEGORIES: [&str; 6] = [
    "General",
    "Venue",
    "Catering",
    "Attire",
    "Photography",
    "Other",
];

/// Validation failure for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Task text must contain non-whitespace content.
    EmptyText,
    /// Category string must not be blank.
    EmptyCategory,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
            Self::EmptyCategory => write!(f, "task category cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// One checklist task document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned id, or a `local-` placeholder while a create is in flight.
    pub id: RecordId,
    pub text: String,
    pub completed: bool,
    pub category: String,
    /// Optional deadline in epoch milliseconds.
    pub deadline: Option<i64>,
    /// Epoch milliseconds, set when the task is first written.
    pub created_at: i64,
}

impl Task {
    /// Creates an unsent, uncompleted task; the sync layer assigns the id.
    pub fn new(text: impl Into<String>, category: Option<&str>, deadline: Option<i64>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_TASK_CATEGORY);
        Self {
            id: RecordId::new(),
            text: text.into().trim().to_string(),
            completed: false,
            category: category.to_string(),
            deadline,
            created_at: 0,
        }
    }

    /// Checks write-path rules.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        if self.category.trim().is_empty() {
            return Err(TaskValidationError::EmptyCategory);
        }
        Ok(())
    }

    /// Whether the deadline has passed for an uncompleted task.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) => !self.completed && now_ms > deadline,
            None => false,
        }
    }

    /// Milliseconds until the deadline, if one is set and still ahead.
    pub fn time_remaining_ms(&self, now_ms: i64) -> Option<i64> {
        self.deadline
            .map(|deadline| deadline - now_ms)
            .filter(|remaining| *remaining > 0)
    }
}
