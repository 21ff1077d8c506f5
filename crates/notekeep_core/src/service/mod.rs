//! Store-facing services.
//!
//! # Responsibility
//! - Own connection lifecycle on top of the repository layer.
//! - Keep HTTP and sync layers decoupled from SQLite details.

pub mod note_store;
