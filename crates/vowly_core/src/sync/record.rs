//! Typed bridge between collection records and the tagged store payloads.

use crate::model::expense::Expense;
use crate::model::note::Note;
use crate::model::task::Task;
use crate::model::RecordId;
use crate::store::{EntityKind, RecordData, Snapshot};

/// A record kind that lives in a synced, multi-record collection.
///
/// The budget singleton intentionally does not implement this; it is a
/// single document handled directly by the budget service.
pub trait CollectionRecord: Clone + Send + 'static {
    const KIND: EntityKind;

    fn record_id(&self) -> &str;

    /// Overwrites the id, used when assigning an optimistic placeholder.
    fn set_record_id(&mut self, id: RecordId);

    fn into_data(self) -> RecordData;

    /// Extracts this kind's records from a snapshot; `None` on a kind
    /// mismatch, which callers treat as a contract violation to log.
    fn from_snapshot(snapshot: Snapshot) -> Option<Vec<Self>>;
}

impl CollectionRecord for Expense {
    const KIND: EntityKind = EntityKind::Expenses;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn into_data(self) -> RecordData {
        RecordData::Expense(self)
    }

    fn from_snapshot(snapshot: Snapshot) -> Option<Vec<Self>> {
        match snapshot {
            Snapshot::Expenses(expenses) => Some(expenses),
            _ => None,
        }
    }
}

impl CollectionRecord for Task {
    const KIND: EntityKind = EntityKind::Tasks;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn into_data(self) -> RecordData {
        RecordData::Task(self)
    }

    fn from_snapshot(snapshot: Snapshot) -> Option<Vec<Self>> {
        match snapshot {
            Snapshot::Tasks(tasks) => Some(tasks),
            _ => None,
        }
    }
}

impl CollectionRecord for Note {
    const KIND: EntityKind = EntityKind::Notes;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn into_data(self) -> RecordData {
        RecordData::Note(self)
    }

    fn from_snapshot(snapshot: Snapshot) -> Option<Vec<Self>> {
        match snapshot {
            Snapshot::Notes(notes) => Some(notes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CollectionRecord;
    use crate::model::expense::{Expense, ExpenseCategory};
    use crate::model::task::Task;
    use crate::store::Snapshot;

    #[test]
    fn snapshot_extraction_rejects_kind_mismatch() {
        let task = Task::new("taste cakes", None, None);
        let snapshot = Snapshot::Tasks(vec![task.clone()]);
        assert!(Expense::from_snapshot(snapshot.clone()).is_none());
        let tasks = Task::from_snapshot(snapshot).expect("matching kind should extract");
        assert_eq!(tasks[0].text, task.text);
    }

    #[test]
    fn set_record_id_overwrites() {
        let mut expense = Expense::new("band deposit", 500.0, ExpenseCategory::Other);
        expense.set_record_id("abc".to_string());
        assert_eq!(expense.record_id(), "abc");
    }
}
