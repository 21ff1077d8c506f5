//! In-memory note session state.
//!
//! # Responsibility
//! - Hold the client-side notes collection, the active note and edit mode.
//! - Apply UI mutations as pure, synchronous state transitions.
//!
//! # Invariants
//! - Note ids stay unique inside the collection.
//! - New notes are prepended.
//! - `apply` reports whether the collection changed; selection and edit mode
//!   changes never count as collection changes.

use crate::model::note::{Note, NoteId};

/// One UI-triggered state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteAction {
    /// Prepend a freshly created note and open it for editing.
    Create(Note),
    Select(Note),
    /// Replace the note sharing this id, make it active and leave edit mode.
    Save(Note),
    Delete(NoteId),
    BeginEdit,
    CancelEdit,
}

/// Client-side view of the notes collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesSession {
    notes: Vec<Note>,
    active: Option<Note>,
    editing: bool,
}

impl NotesSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.active.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn find(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Adopts an authoritative collection loaded from the store.
    ///
    /// Selection is kept only if the active note is still present.
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        let still_present = self
            .active
            .as_ref()
            .is_some_and(|active| self.notes.iter().any(|note| note.id == active.id));
        if !still_present {
            self.active = None;
            self.editing = false;
        }
    }

    /// Applies one action and returns whether the collection changed.
    pub fn apply(&mut self, action: NoteAction) -> bool {
        match action {
            NoteAction::Create(note) => {
                if self.find(&note.id).is_some() {
                    return false;
                }
                self.notes.insert(0, note.clone());
                self.active = Some(note);
                self.editing = true;
                true
            }
            NoteAction::Select(note) => {
                self.active = Some(note);
                self.editing = false;
                false
            }
            NoteAction::Save(updated) => {
                let Some(slot) = self.notes.iter_mut().find(|note| note.id == updated.id) else {
                    return false;
                };
                *slot = updated.clone();
                self.active = Some(updated);
                self.editing = false;
                true
            }
            NoteAction::Delete(id) => {
                let before = self.notes.len();
                self.notes.retain(|note| note.id != id);
                if self.active.as_ref().is_some_and(|active| active.id == id) {
                    self.active = None;
                    self.editing = false;
                }
                self.notes.len() != before
            }
            NoteAction::BeginEdit => {
                self.editing = self.active.is_some();
                false
            }
            NoteAction::CancelEdit => {
                self.editing = false;
                false
            }
        }
    }

    /// Creates a new draft note, prepends it and opens it for editing.
    pub fn create_note(&mut self) -> Note {
        let note = Note::new();
        self.apply(NoteAction::Create(note.clone()));
        note
    }

    pub fn select_note(&mut self, note: Note) {
        self.apply(NoteAction::Select(note));
    }

    /// Returns `false` when no note shares `updated.id`.
    pub fn save_note(&mut self, updated: Note) -> bool {
        self.apply(NoteAction::Save(updated))
    }

    /// Returns `false` when no note has this id.
    pub fn delete_note(&mut self, id: &str) -> bool {
        self.apply(NoteAction::Delete(id.to_string()))
    }
}
