//! Store configuration.
//!
//! # Responsibility
//! - Describe where the notes database lives and how connecting is retried.
//! - Read the same settings from the process environment.
//!
//! # Invariants
//! - A missing connection string is not an error here; it is reported by the
//!   store on its first operation.
//! - `uri` names a data directory; the database file is
//!   `<uri>/<db_name>.sqlite3`. `:memory:` selects an in-memory database.
//! - `db_name` never escapes the data directory: names with path separators
//!   or dot segments are rejected when resolving the target.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the connection string.
pub const STORE_URI_ENV: &str = "NOTES_STORE_URI";
/// Environment variable overriding the database name.
pub const STORE_DB_ENV: &str = "NOTES_STORE_DB";
/// Database name used when no override is given.
pub const DEFAULT_DB_NAME: &str = "notesApp";
/// Connection string selecting a private in-memory database.
pub const IN_MEMORY_URI: &str = ":memory:";
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Resolved location of the notes database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Memory,
    File(PathBuf),
}

/// Why a config cannot be resolved to a [`StoreTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingUri,
    InvalidDbName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUri => write!(f, "connection string not set ({STORE_URI_ENV})"),
            Self::InvalidDbName(name) => write!(
                f,
                "database name must be a plain file name ({STORE_DB_ENV}): {name:?}"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Settings consumed by [`crate::NoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection string; `None` until configured.
    pub uri: Option<String>,
    pub db_name: String,
    /// Total connection attempts before giving up. Always at least 1.
    pub connect_attempts: u32,
    /// Fixed delay between connection attempts.
    pub retry_delay: Duration,
}

impl StoreConfig {
    /// Builds a config; blank values fall back to "absent" and the default
    /// database name respectively.
    pub fn new(uri: Option<String>, db_name: Option<String>) -> Self {
        let uri = uri
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let db_name = db_name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        Self {
            uri,
            db_name,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Reads `NOTES_STORE_URI` and `NOTES_STORE_DB`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(STORE_URI_ENV).ok(),
            std::env::var(STORE_DB_ENV).ok(),
        )
    }

    pub fn in_memory() -> Self {
        Self::new(Some(IN_MEMORY_URI.to_string()), None)
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    /// Resolves the database location.
    pub fn target(&self) -> Result<StoreTarget, ConfigError> {
        let uri = self.uri.as_deref().ok_or(ConfigError::MissingUri)?;
        if uri == IN_MEMORY_URI {
            return Ok(StoreTarget::Memory);
        }
        if !is_plain_name(&self.db_name) {
            return Err(ConfigError::InvalidDbName(self.db_name.clone()));
        }
        Ok(StoreTarget::File(
            PathBuf::from(uri).join(format!("{}.sqlite3", self.db_name)),
        ))
    }
}

fn is_plain_name(name: &str) -> bool {
    !matches!(name, "." | "..") && !name.contains(['/', '\\', '\0'])
}
