//! Core domain logic for Notekeep.
//! This crate is the single source of truth for the notes collection and its
//! synchronization contract.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, StoreConfig, StoreTarget};
pub use logging::{default_log_level, init_logging, logging_status, LogDestination};
pub use model::note::{
    format_created_at, now_millis, Note, NoteId, NoteValidationError, DEFAULT_NOTE_TITLE,
};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_store::{NoteStore, StoreError, StoreResult};
pub use sync::api::{NotesApi, StoreNotesApi, TransportError};
pub use sync::client::{
    load_notes, merge_by_id, MigrationOutcome, MigrationPolicy, SyncClient, SyncPhase, SyncStatus,
};
pub use sync::legacy::{FileLegacyStore, LegacyStore, LegacyStoreError, LEGACY_NOTES_KEY};
pub use sync::session::{NoteAction, NotesSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
