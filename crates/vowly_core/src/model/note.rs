//! Sticky-note record with its fixed color/emoji palette.
//!
//! # Responsibility
//! - Define the note document shape and the closed palette sets.
//! - Normalize titles and apply the "Untitled" fallback.
//!
//! # Invariants
//! - `color` and `emoji` only ever hold palette values.
//! - `title` is never blank after construction.
//! - `text` contains non-whitespace content.

use crate::model::RecordId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Title used when the user leaves the field blank.
pub const UNTITLED: &str = "Untitled";

/// Fixed note color palette, serialized as the hex strings stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteColor {
    #[serde(rename = "#4ECDC4")]
    Teal,
    #[serde(rename = "#FF6B6B")]
    Coral,
    #[serde(rename = "#FFD93D")]
    Sunshine,
    #[serde(rename = "#6A67CE")]
    Violet,
}

/// Palette in picker order.
pub const NOTE_COLORS: [NoteColor; 4] = [
    NoteColor::Teal,
    NoteColor::Coral,
    NoteColor::Sunshine,
    NoteColor::Violet,
];

impl NoteColor {
    /// Hex value stored in documents and rendered by the UI.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Teal => "#4ECDC4",
            Self::Coral => "#FF6B6B",
            Self::Sunshine => "#FFD93D",
            Self::Violet => "#6A67CE",
        }
    }

    /// Parses a stored hex value back into the palette.
    pub fn parse(value: &str) -> Option<Self> {
        NOTE_COLORS
            .into_iter()
            .find(|color| color.hex().eq_ignore_ascii_case(value))
    }
}

/// Fixed note emoji set, serialized as the glyphs stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteEmoji {
    #[serde(rename = "📝")]
    Memo,
    #[serde(rename = "💡")]
    Idea,
    #[serde(rename = "📌")]
    Pin,
    #[serde(rename = "✅")]
    Check,
    #[serde(rename = "🧠")]
    Brain,
    #[serde(rename = "🎯")]
    Target,
}

/// Emoji set in picker order.
pub const NOTE_EMOJIS: [NoteEmoji; 6] = [
    NoteEmoji::Memo,
    NoteEmoji::Idea,
    NoteEmoji::Pin,
    NoteEmoji::Check,
    NoteEmoji::Brain,
    NoteEmoji::Target,
];

impl NoteEmoji {
    /// Glyph stored in documents and rendered by the UI.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Memo => "📝",
            Self::Idea => "💡",
            Self::Pin => "📌",
            Self::Check => "✅",
            Self::Brain => "🧠",
            Self::Target => "🎯",
        }
    }

    /// Parses a stored glyph back into the set.
    pub fn parse(value: &str) -> Option<Self> {
        NOTE_EMOJIS.into_iter().find(|emoji| emoji.glyph() == value)
    }
}

/// Validation failure for note writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Note body must contain non-whitespace text.
    EmptyText,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "note text cannot be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// One sticky-note document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned id, or a `local-` placeholder while a create is in flight.
    pub id: RecordId,
    pub title: String,
    pub text: String,
    pub color: NoteColor,
    pub emoji: NoteEmoji,
    /// Epoch milliseconds, set when the note is first written.
    pub created_at: i64,
}

impl Note {
    /// Creates an unsent note; blank titles fall back to [`UNTITLED`].
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        color: NoteColor,
        emoji: NoteEmoji,
    ) -> Self {
        Self {
            id: RecordId::new(),
            title: normalize_title(&title.into()),
            text: text.into().trim().to_string(),
            color,
            emoji,
            created_at: 0,
        }
    }

    /// Checks write-path rules.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.text.trim().is_empty() {
            return Err(NoteValidationError::EmptyText);
        }
        Ok(())
    }
}

/// Collapses whitespace runs and applies the untitled fallback.
pub fn normalize_title(title: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(title, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}
