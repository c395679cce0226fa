// ABOUTME: Data layer and persistence for Tasklane
// ABOUTME: SQLite pool setup, schema convergence, and dense-position primitives

use thiserror::Error;

pub mod defaults;
pub mod pool;
pub mod positions;
pub mod schema;

pub use defaults::{find_list_id, get_or_create_list, DefaultList, INBOX, NOTEPAD};
pub use pool::{begin_immediate, connect, connect_in_memory, StorageConfig};
pub use schema::{ensure_schema, SchemaReport, MIGRATIONS, TARGET_SCHEMA};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// True when the underlying SQLite error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
