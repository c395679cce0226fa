// ABOUTME: Shared state handed to every API handler
// ABOUTME: Holds the SQLite pool and the list, todo, and file storage layers

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use tasklane_files::FileStorage;
use tasklane_lists::ListStorage;
use tasklane_todos::TodoStorage;

/// Shared database state for API handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub db_path: PathBuf,
    pub list_storage: Arc<ListStorage>,
    pub todo_storage: Arc<TodoStorage>,
    pub file_storage: Arc<FileStorage>,
}

impl DbState {
    /// Create new database state from a SQLite pool
    pub fn new(pool: SqlitePool, db_path: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            list_storage: Arc::new(ListStorage::new(pool.clone())),
            todo_storage: Arc::new(TodoStorage::new(pool.clone())),
            file_storage: Arc::new(FileStorage::new(pool.clone(), upload_dir)),
            db_path: absolute(db_path.into()),
            pool,
        }
    }
}

/// Resolve a path against the working directory without touching the filesystem
fn absolute(path: PathBuf) -> PathBuf {
    if path.as_os_str() == ":memory:" {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}
