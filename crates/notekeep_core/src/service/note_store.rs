//! Note Store: the system of record for the notes collection.
//!
//! # Responsibility
//! - Own one lazily opened SQLite connection for the process lifetime.
//! - Expose `read_all`, `replace_all` and `ensure_unique_index`.
//! - Translate repository failures into the store error taxonomy.
//!
//! # Invariants
//! - The connection is opened on first use and reused afterwards; it is
//!   reopened only after an explicit `disconnect`.
//! - Opening is retried `connect_attempts` times with a fixed delay.
//! - A failed open is reported to the caller of that operation only; the
//!   next operation tries again.
//! - The unique index on `notes.id` exists before any read or write.

use crate::config::{StoreConfig, StoreTarget};
use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Connection string absent or database name unusable.
    Configuration(String),
    /// Every connection attempt failed.
    Connectivity { attempts: u32, last_error: String },
    /// A write violated the unique index on note ids.
    Integrity(NoteId),
    Validation(NoteValidationError),
    Repo(RepoError),
}

impl StoreError {
    /// Short machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Connectivity { .. } => "connectivity",
            Self::Integrity(_) => "integrity",
            Self::Validation(_) => "validation",
            Self::Repo(_) => "storage",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "store is not configured: {message}"),
            Self::Connectivity {
                attempts,
                last_error,
            } => write!(
                f,
                "failed to connect to note store after {attempts} attempts: {last_error}"
            ),
            Self::Integrity(id) => write!(f, "duplicate note id violates unique index: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateId(id) => Self::Integrity(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Long-lived handle over the notes database.
///
/// Share it behind an `Arc`; all operations take `&self` and serialize on
/// the inner connection.
pub struct NoteStore {
    config: StoreConfig,
    conn: Mutex<Option<Connection>>,
}

impl NoteStore {
    /// Creates a disconnected store. No I/O happens until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns every stored note.
    ///
    /// An empty or freshly created database yields an empty vector.
    pub fn read_all(&self) -> StoreResult<Vec<Note>> {
        let started_at = Instant::now();
        let result = self.with_repo(|repo| repo.read_all());
        match &result {
            Ok(notes) => info!(
                "event=notes_read module=store status=ok count={} duration_ms={}",
                notes.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_read module=store status=error error_code={} error={}",
                err.code(),
                err
            ),
        }
        result
    }

    /// Discards all stored notes and stores exactly `notes`.
    ///
    /// # Errors
    /// - `StoreError::Integrity` when two notes share an id. The previous
    ///   collection is left untouched.
    /// - `StoreError::Validation` when a note id is blank.
    pub fn replace_all(&self, notes: &[Note]) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.with_repo(|repo| repo.replace_all(notes));
        match &result {
            Ok(()) => info!(
                "event=notes_replace module=store status=ok count={} duration_ms={}",
                notes.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_replace module=store status=error count={} error_code={} error={}",
                notes.len(),
                err.code(),
                err
            ),
        }
        result
    }

    /// Ensures the unique index on note ids exists. Safe to call repeatedly.
    pub fn ensure_unique_index(&self) -> StoreResult<()> {
        self.with_repo(|repo| repo.ensure_unique_index())
    }

    /// Drops the connection; the next operation reconnects.
    pub fn disconnect(&self) {
        if self.lock().take().is_some() {
            info!("event=store_disconnect module=store status=ok");
        }
    }

    fn with_repo<T>(
        &self,
        op: impl FnOnce(&mut SqliteNoteRepository<'_>) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.lock();
        let mut conn = match guard.take() {
            Some(conn) => conn,
            None => connect(&self.config)?,
        };
        let result = SqliteNoteRepository::try_new(&mut conn)
            .and_then(|mut repo| op(&mut repo))
            .map_err(StoreError::from);
        *guard = Some(conn);
        result
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // A panic while holding the lock cannot leave a half-written
        // connection behind; keep using it.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn connect(config: &StoreConfig) -> StoreResult<Connection> {
    let target = config.target().map_err(|err| {
        error!("event=store_connect module=store status=error error_code=configuration");
        StoreError::Configuration(err.to_string())
    })?;

    let attempts = config.connect_attempts.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match open_target(&target) {
            Ok(conn) => {
                info!("event=store_connect module=store status=ok attempt={attempt}");
                return Ok(conn);
            }
            Err(err) => {
                warn!(
                    "event=store_connect module=store status=retry attempt={attempt} max_attempts={attempts} error={err}"
                );
                last_error = err.to_string();
                if attempt < attempts {
                    std::thread::sleep(config.retry_delay);
                }
            }
        }
    }

    error!(
        "event=store_connect module=store status=error error_code=connectivity attempts={attempts}"
    );
    Err(StoreError::Connectivity {
        attempts,
        last_error,
    })
}

fn open_target(target: &StoreTarget) -> RepoResult<Connection> {
    let mut conn = match target {
        StoreTarget::Memory => open_db_in_memory(),
        StoreTarget::File(path) => open_db(path),
    }
    .map_err(RepoError::from)?;
    SqliteNoteRepository::try_new(&mut conn)?.ensure_unique_index()?;
    Ok(conn)
}
