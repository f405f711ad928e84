//! Optimistic mutation coordinator over one live collection.
//!
//! # Responsibility
//! - Keep a local mirror of one remote collection, replaced wholesale by
//!   every stream snapshot.
//! - Apply create/update/delete mutations to the mirror before the remote
//!   write resolves, and restore the captured pre-mutation state on failure.
//!
//! # Invariants
//! - The mirror mutex is never held across a store call; re-entrant snapshot
//!   dispatch during a write therefore cannot deadlock.
//! - Rollback restores the exact captured snapshot, never a recomputation.
//! - Optimistic placeholder ids are unique for the process lifetime.

use crate::model::{now_epoch_ms, RecordId};
use crate::store::{
    RemoteStore, SessionContext, Snapshot, SnapshotFn, StoreError, Subscription,
};
use crate::sync::record::CollectionRecord;
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const PLACEHOLDER_PREFIX: &str = "local-";

// Timestamp alone can collide for rapid-fire creates; the counter makes the
// placeholder unique for the whole process lifetime.
static PLACEHOLDER_SEQ: AtomicU64 = AtomicU64::new(0);

fn placeholder_record_id() -> RecordId {
    let seq = PLACEHOLDER_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{PLACEHOLDER_PREFIX}{}-{seq}", now_epoch_ms())
}

/// Whether an id is an optimistic placeholder not yet confirmed remotely.
///
/// UIs use this to render in-flight records in a pending style.
pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// The mutation that was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote write failed and the local mirror was rolled back.
///
/// Terminal for this mutation attempt; the caller may re-trigger the same
/// logical action as a brand-new mutation.
#[derive(Debug)]
pub struct MutationError {
    pub mutation: MutationKind,
    pub source: StoreError,
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "optimistic {} rolled back: {}",
            self.mutation, self.source
        )
    }
}

impl Error for MutationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Live mirror of one remote collection with optimistic mutations.
pub struct LiveCollection<T: CollectionRecord> {
    store: Arc<dyn RemoteStore>,
    ctx: SessionContext,
    records: Arc<Mutex<Vec<T>>>,
    stream_error: Arc<Mutex<Option<String>>>,
    subscription: Subscription,
}

impl<T: CollectionRecord> LiveCollection<T> {
    /// Subscribes to the collection; the mirror holds the current remote
    /// snapshot when this returns.
    pub fn open(store: Arc<dyn RemoteStore>, ctx: SessionContext) -> Result<Self, StoreError> {
        let records: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
        let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let records_sink = Arc::clone(&records);
        let error_sink = Arc::clone(&stream_error);
        let on_snapshot: SnapshotFn = Box::new(move |snapshot: Snapshot| {
            match T::from_snapshot(snapshot) {
                Some(items) => {
                    *lock(&records_sink) = items;
                    // A healthy snapshot clears any earlier stream failure.
                    *lock(&error_sink) = None;
                }
                None => {
                    error!(
                        "event=snapshot_kind_mismatch module=sync kind={}",
                        T::KIND
                    );
                }
            }
        });

        let error_sink = Arc::clone(&stream_error);
        let kind = T::KIND;
        let on_error = Box::new(move |err: StoreError| {
            error!("event=stream_error module=sync kind={kind} error={err}");
            *lock(&error_sink) = Some(err.to_string());
        });

        let subscription = store.subscribe(&ctx, T::KIND, on_snapshot, on_error)?;
        Ok(Self {
            store,
            ctx,
            records,
            stream_error,
            subscription,
        })
    }

    /// Current mirror contents, in remote collection order.
    pub fn records(&self) -> Vec<T> {
        lock(&self.records).clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        lock(&self.records)
            .iter()
            .find(|record| record.record_id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    /// Last unrecovered stream failure, retained for a retry UI.
    pub fn stream_error(&self) -> Option<String> {
        lock(&self.stream_error).clone()
    }

    /// Dismisses a surfaced stream failure. There is no automatic retry.
    pub fn clear_stream_error(&self) {
        *lock(&self.stream_error) = None;
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Optimistically inserts a record under a placeholder id and issues the
    /// remote create.
    ///
    /// On success the returned id is the store-assigned one; the placeholder
    /// in the mirror is superseded by the next snapshot. On failure the
    /// mirror is restored to the exact pre-insert state.
    pub fn insert(&self, mut record: T) -> Result<RecordId, MutationError> {
        record.set_record_id(placeholder_record_id());
        let before = self.records();
        lock(&self.records).push(record.clone());

        match self.store.write(&self.ctx, None, record.into_data()) {
            Ok(remote_id) => Ok(remote_id),
            Err(source) => Err(self.roll_back(MutationKind::Create, before, source)),
        }
    }

    /// Optimistically replaces the matching record and issues the remote
    /// update. A record absent from the mirror (a snapshot raced ahead) is
    /// still written; the store decides whether the id exists.
    pub fn update(&self, record: T) -> Result<(), MutationError> {
        let id = record.record_id().to_string();
        let before = self.records();
        {
            let mut records = lock(&self.records);
            if let Some(slot) = records
                .iter_mut()
                .find(|existing| existing.record_id() == id)
            {
                *slot = record.clone();
            }
        }

        match self.store.write(&self.ctx, Some(&id), record.into_data()) {
            Ok(_) => Ok(()),
            Err(source) => Err(self.roll_back(MutationKind::Update, before, source)),
        }
    }

    /// Optimistically removes the record and issues the remote delete.
    pub fn remove(&self, id: &str) -> Result<(), MutationError> {
        let before = self.records();
        lock(&self.records).retain(|record| record.record_id() != id);

        match self.store.delete(&self.ctx, T::KIND, id) {
            Ok(()) => Ok(()),
            Err(source) => Err(self.roll_back(MutationKind::Delete, before, source)),
        }
    }

    fn roll_back(
        &self,
        mutation: MutationKind,
        before: Vec<T>,
        source: StoreError,
    ) -> MutationError {
        *lock(&self.records) = before;
        warn!(
            "event=mutation_rollback module=sync kind={} op={mutation} error={source}",
            T::KIND
        );
        MutationError { mutation, source }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().expect("sync mirror mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{is_placeholder_id, placeholder_record_id};
    use std::collections::HashSet;

    #[test]
    fn placeholder_ids_are_unique_even_in_a_tight_loop() {
        let ids: HashSet<_> = (0..1_000).map(|_| placeholder_record_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn placeholder_ids_are_recognizable() {
        assert!(is_placeholder_id(&placeholder_record_id()));
        assert!(!is_placeholder_id("8f14e45fceea167a5a36dedd4bea2543"));
    }
}
