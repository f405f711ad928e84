//! Quick-note use-case service.

use crate::model::note::{Note, NoteColor, NoteEmoji, NoteValidationError};
use crate::model::{now_epoch_ms, RecordId};
use crate::store::{RemoteStore, SessionContext, StoreResult};
use crate::sync::{LiveCollection, MutationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum NoteError {
    /// Note failed validation; no state was touched.
    Invalid(NoteValidationError),
    /// Remote write failed; local state was rolled back.
    Mutation(MutationError),
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Mutation(err) => Some(err),
        }
    }
}

impl From<MutationError> for NoteError {
    fn from(value: MutationError) -> Self {
        Self::Mutation(value)
    }
}

/// Notebook facade over the live note collection.
pub struct Notebook {
    notes: LiveCollection<Note>,
}

impl Notebook {
    /// Opens the live subscription; the mirror holds current remote state
    /// when this returns.
    pub fn open(store: Arc<dyn RemoteStore>, ctx: SessionContext) -> StoreResult<Self> {
        Ok(Self {
            notes: LiveCollection::open(store, ctx)?,
        })
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.records()
    }

    /// Adds a note; blank titles fall back to "Untitled".
    pub fn add_note(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        color: NoteColor,
        emoji: NoteEmoji,
    ) -> Result<RecordId, NoteError> {
        let mut note = Note::new(title, text, color, emoji);
        note.created_at = now_epoch_ms();
        note.validate().map_err(NoteError::Invalid)?;
        Ok(self.notes.insert(note)?)
    }

    pub fn delete_note(&self, id: &str) -> Result<(), NoteError> {
        Ok(self.notes.remove(id)?)
    }

    /// Last unrecovered stream failure, retained for a retry UI.
    pub fn stream_error(&self) -> Option<String> {
        self.notes.stream_error()
    }

    pub fn clear_stream_error(&self) {
        self.notes.clear_stream_error();
    }
}
