//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read the whole notes collection.
//! - Replace the whole collection in one write (full replace, never upsert).
//! - Own the unique index on `notes.id`.
//!
//! # Invariants
//! - `replace_all` deletes and inserts inside a single transaction; a failed
//!   call leaves the previous collection untouched.
//! - Duplicate ids are rejected by the unique index, never deduplicated.
//! - `read_all` returns rows in insertion order of the last write.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteValidationError};
use rusqlite::{params, Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const UNIQUE_INDEX_NAME: &str = "idx_notes_id_unique";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    /// Write violated the unique index on `notes.id`.
    DuplicateId(NoteId),
    Db(DbError),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "duplicate note id: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateId(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the notes collection.
pub trait NoteRepository {
    /// Returns every stored note; empty when nothing was written yet.
    fn read_all(&self) -> RepoResult<Vec<Note>>;
    /// Discards all stored notes and stores exactly `notes`.
    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<()>;
    /// Creates the unique index on note ids. Idempotent.
    fn ensure_unique_index(&self) -> RepoResult<()>;
}

/// SQLite-backed notes repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        if !table_exists(conn, "notes")? {
            return Err(RepoError::MissingRequiredTable("notes"));
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn read_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at
             FROM notes
             ORDER BY seq ASC;",
        )?;
        let notes = stmt
            .query_map([], |row| {
                Ok(Note {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    content: row.get("content")?,
                    created_at: row.get("created_at")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<()> {
        for note in notes {
            note.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notes;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO notes (id, title, content, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for note in notes {
                insert
                    .execute(params![
                        note.id.as_str(),
                        note.title.as_str(),
                        note.content.as_str(),
                        note.created_at,
                    ])
                    .map_err(|err| {
                        let err = DbError::from(err);
                        if err.is_unique_violation() {
                            RepoError::DuplicateId(note.id.clone())
                        } else {
                            RepoError::Db(err)
                        }
                    })?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn ensure_unique_index(&self) -> RepoResult<()> {
        self.conn.execute_batch(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {UNIQUE_INDEX_NAME} ON notes (id);"
        ))?;
        Ok(())
    }
}

/// Returns whether the unique index on `notes.id` exists.
pub fn unique_index_exists(conn: &Connection) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'index' AND name = ?1
        );",
        [UNIQUE_INDEX_NAME],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
