//! Repository layer for the notes collection.
//!
//! # Responsibility
//! - Define the read-all / replace-all data access contract.
//! - Keep SQLite query details out of the store handle and sync layers.
//!
//! # Invariants
//! - Repository writes validate every note before touching storage.

pub mod note_repo;
