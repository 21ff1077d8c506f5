//! Transport seam between the sync client and the Note Store.
//!
//! # Responsibility
//! - Define the two calls the sync client makes: fetch all, push all.
//! - Provide an in-process transport that talks to a `NoteStore` directly.

use crate::model::note::Note;
use crate::service::note_store::NoteStore;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Client-side transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response.
    Request(String),
    /// The server answered with a non-success status.
    Status { status: u16, detail: String },
    /// The response body could not be decoded.
    Decode(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(message) => write!(f, "request failed: {message}"),
            Self::Status { status, detail } if detail.is_empty() => {
                write!(f, "server returned status {status}")
            }
            Self::Status { status, detail } => {
                write!(f, "server returned status {status}: {detail}")
            }
            Self::Decode(message) => write!(f, "invalid response body: {message}"),
        }
    }
}

impl Error for TransportError {}

/// Remote view of the Note Store used by the sync client.
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// Fetches the authoritative collection.
    async fn fetch_notes(&self) -> Result<Vec<Note>, TransportError>;
    /// Replaces the whole stored collection with `notes`.
    async fn push_notes(&self, notes: &[Note]) -> Result<(), TransportError>;
}

/// Transport that calls a local `NoteStore` on the blocking thread pool.
#[derive(Clone)]
pub struct StoreNotesApi {
    store: Arc<NoteStore>,
}

impl StoreNotesApi {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotesApi for StoreNotesApi {
    async fn fetch_notes(&self) -> Result<Vec<Note>, TransportError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.read_all())
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?
            .map_err(|err| TransportError::Status {
                status: 500,
                detail: err.to_string(),
            })
    }

    async fn push_notes(&self, notes: &[Note]) -> Result<(), TransportError> {
        let store = Arc::clone(&self.store);
        let notes = notes.to_vec();
        tokio::task::spawn_blocking(move || store.replace_all(&notes))
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?
            .map_err(|err| TransportError::Status {
                status: 500,
                detail: err.to_string(),
            })
    }
}
