//! Legacy client-only note storage.
//!
//! # Responsibility
//! - Read notes written by pre-server clients under a single storage key.
//! - Clear that key once its notes reached the Note Store.
//!
//! # Invariants
//! - A missing or blank key reads as an empty collection.
//! - Malformed data is reported, never silently discarded.

use crate::model::note::Note;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Storage key that held the JSON-encoded notes array.
pub const LEGACY_NOTES_KEY: &str = "notes";

#[derive(Debug)]
pub enum LegacyStoreError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
}

impl Display for LegacyStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "legacy store I/O failed: {err}"),
            Self::Malformed(err) => write!(f, "legacy notes are not a JSON note array: {err}"),
        }
    }
}

impl Error for LegacyStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Malformed(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LegacyStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Pre-migration local note storage.
pub trait LegacyStore: Send + Sync {
    fn load(&self) -> Result<Vec<Note>, LegacyStoreError>;
    fn clear(&self) -> Result<(), LegacyStoreError>;
}

/// Directory-backed key/value storage; key `notes` lives in `notes.json`.
#[derive(Debug, Clone)]
pub struct FileLegacyStore {
    dir: PathBuf,
    key: String,
}

impl FileLegacyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_key(dir, LEGACY_NOTES_KEY)
    }

    pub fn with_key(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    /// Writes `notes` under the key, creating the directory when needed.
    pub fn save(&self, notes: &[Note]) -> Result<(), LegacyStoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string(notes).map_err(LegacyStoreError::Malformed)?;
        std::fs::write(self.path(), body)?;
        Ok(())
    }
}

impl LegacyStore for FileLegacyStore {
    fn load(&self) -> Result<Vec<Note>, LegacyStoreError> {
        let raw = match std::fs::read_to_string(self.path()) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        parse_legacy_notes(&raw)
    }

    fn clear(&self) -> Result<(), LegacyStoreError> {
        remove_if_exists(&self.path())
    }
}

fn parse_legacy_notes(raw: &str) -> Result<Vec<Note>, LegacyStoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(LegacyStoreError::Malformed)
}

fn remove_if_exists(path: &Path) -> Result<(), LegacyStoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
