//! Typed domain records for the wedding-planning core.
//!
//! # Responsibility
//! - Define one explicit struct per backend document kind.
//! - Validate record shape before anything reaches the store boundary.
//!
//! # Invariants
//! - Every record carries a `RecordId` unique within its owner's collection.
//! - Records serialize with the exact field names of the backend documents.

pub mod budget;
pub mod expense;
pub mod note;
pub mod task;

use std::time::{SystemTime, UNIX_EPOCH};

/// Stable identifier for a remote document.
///
/// Confirmed records carry a store-assigned id; optimistically inserted
/// records carry a `local-` placeholder until the next snapshot supersedes
/// it or the mutation rolls back.
pub type RecordId = String;

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Used for `date`/`createdAt` stamps set on write.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
