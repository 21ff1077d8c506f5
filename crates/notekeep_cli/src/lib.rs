//! Terminal client for a Notekeep server.

pub mod commands;
pub mod http_api;

pub use commands::{run_session, Command};
pub use http_api::HttpNotesApi;
