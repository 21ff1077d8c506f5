//! Domain model for the notes collection.
//!
//! # Responsibility
//! - Define the canonical `Note` record shared by store, sync and HTTP layers.
//!
//! # Invariants
//! - Every note is identified by a stable, non-empty `NoteId`.
//! - Deletion is hard removal from the collection; there are no tombstones.

pub mod note;
