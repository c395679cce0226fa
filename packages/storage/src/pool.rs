// ABOUTME: SQLite connection pool construction
// ABOUTME: Applies per-connection PRAGMAs and opens write transactions

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::{StorageError, StorageResult};

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl StorageConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("todo.db"),
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

/// Open (creating if needed) the database file described by `config`
pub async fn connect(config: &StorageConfig) -> StorageResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    debug!("Connecting to database: {}", config.path.display());

    let journal_mode = if config.enable_wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };

    // PRAGMAs set here apply to every pooled connection, not just the first one
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(journal_mode)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    Ok(pool)
}

/// Single-connection in-memory database, used by tests and tooling.
///
/// The connection is never recycled, since closing it would discard the data.
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(StorageError::Sqlx)?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)
}

/// Begin a transaction that takes the database write lock up front.
///
/// A deferred transaction that reads before writing can fail with
/// `SQLITE_BUSY` when another writer commits in between; taking the lock at
/// `BEGIN` makes concurrent writers queue on the busy timeout instead.
pub async fn begin_immediate(pool: &SqlitePool) -> StorageResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(StorageError::Sqlx)
}
