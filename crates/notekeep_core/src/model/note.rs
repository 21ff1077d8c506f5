//! Note domain model.
//!
//! # Responsibility
//! - Define the single persisted record of the notes collection.
//! - Provide creation helpers that assign identity and timestamp once.
//!
//! # Invariants
//! - `id` is non-empty and never changes after creation.
//! - `created_at` is set once at creation and never mutated.
//! - Edits produce a new `Note` value sharing the same `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Title assigned to freshly created notes.
pub const DEFAULT_NOTE_TITLE: &str = "New Note";

/// Stable identifier of a note.
///
/// Kept as plain text so ids minted by older clients (for example
/// millisecond timestamps) are accepted verbatim.
pub type NoteId = String;

/// One user-authored text entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique within the collection.
    pub id: NoteId,
    pub title: String,
    /// May be empty.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Validation error for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Creates a draft note with a generated id, default title, empty
    /// content and the current timestamp.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string(), DEFAULT_NOTE_TITLE, "", now_millis())
    }

    /// Creates a note with caller-provided identity.
    ///
    /// Used by import and replay paths where identity already exists.
    pub fn with_id(
        id: impl Into<NoteId>,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Returns an edited copy that keeps `id` and `created_at`.
    pub fn edited(&self, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            title: title.into(),
            content: content.into(),
            created_at: self.created_at,
        }
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        Ok(())
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Renders `created_at` as a short UTC date such as `Mar 5, 2024`.
///
/// Out-of-range timestamps fall back to the raw millisecond value.
pub fn format_created_at(created_at: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(created_at) {
        Some(value) => value.format("%b %-d, %Y").to_string(),
        None => created_at.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_created_at, Note, NoteValidationError, DEFAULT_NOTE_TITLE};

    #[test]
    fn new_note_has_defaults_and_unique_id() {
        let first = Note::new();
        let second = Note::new();
        assert_eq!(first.title, DEFAULT_NOTE_TITLE);
        assert!(first.content.is_empty());
        assert!(first.created_at > 0);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn edited_keeps_identity_and_timestamp() {
        let note = Note::with_id("n1", "a", "b", 42);
        let edited = note.edited("title", "body");
        assert_eq!(edited.id, "n1");
        assert_eq!(edited.created_at, 42);
        assert_eq!(edited.title, "title");
        assert_eq!(edited.content, "body");
    }

    #[test]
    fn validate_rejects_blank_id() {
        let note = Note::with_id("  ", "t", "", 1);
        assert_eq!(note.validate(), Err(NoteValidationError::EmptyId));
    }

    #[test]
    fn serializes_with_camel_case_created_at() {
        let note = Note::with_id("1700000000000", "t", "c", 1_700_000_000_000);
        let json = serde_json::to_value(&note).expect("note should serialize");
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["id"], "1700000000000");
    }

    #[test]
    fn format_created_at_renders_short_date() {
        assert_eq!(format_created_at(1_709_640_000_000), "Mar 5, 2024");
    }
}
