// ABOUTME: File storage layer using SQLite metadata and an on-disk blob directory
// ABOUTME: Checksum de-duplicated uploads, listing, blob reads, and deletes

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use tasklane_storage::StorageError;

use crate::policy::prepare_upload;
use crate::types::{StoredFile, Upload, UploadOutcome};
use crate::{FileError, FileResult};

const FILE_COLUMNS: &str = "id, name, COALESCE(mime, 'application/octet-stream') AS mime, size, checksum, created_at, path";

pub struct FileStorage {
    pool: SqlitePool,
    upload_dir: PathBuf,
}

impl FileStorage {
    pub fn new(pool: SqlitePool, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            upload_dir: upload_dir.into(),
        }
    }

    /// Create the blob directory if it does not exist yet
    pub async fn ensure_upload_dir(&self) -> FileResult<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Store an upload, de-duplicating by content checksum.
    ///
    /// Identical bytes always resolve to the same row and the same blob; only
    /// the first upload of some content writes to disk.
    pub async fn upload(&self, upload: Upload) -> FileResult<UploadOutcome> {
        let prepared = prepare_upload(upload)?;

        if let Some(existing) = self.find_by_checksum(&prepared.checksum).await? {
            debug!("Upload matches existing file {}", existing.id);
            return Ok(UploadOutcome {
                file: existing,
                created: false,
            });
        }

        self.ensure_upload_dir().await?;
        let blob_path = self.upload_dir.join(prepared.blob_name());
        let wrote_blob = if tokio::fs::try_exists(&blob_path).await? {
            false
        } else {
            tokio::fs::write(&blob_path, &prepared.bytes).await?;
            true
        };
        let path = blob_path.to_string_lossy().into_owned();

        let inserted = sqlx::query(
            "INSERT INTO files (name, mime, size, path, checksum) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&prepared.name)
        .bind(&prepared.mime)
        .bind(prepared.bytes.len() as i64)
        .bind(&path)
        .bind(&prepared.checksum)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx);

        match inserted {
            Ok(result) => {
                let file = self.get(result.last_insert_rowid()).await?;
                info!("Stored file {} ({} bytes)", file.id, file.size);
                Ok(UploadOutcome {
                    file,
                    created: true,
                })
            }
            Err(e) if e.is_unique_violation() => {
                // A concurrent upload of the same content won the insert
                let winner = self
                    .find_by_checksum(&prepared.checksum)
                    .await?
                    .ok_or(FileError::Storage(e))?;

                if wrote_blob && winner.path != path {
                    remove_blob(&blob_path).await;
                }
                Ok(UploadOutcome {
                    file: winner,
                    created: false,
                })
            }
            Err(e) => {
                if wrote_blob {
                    remove_blob(&blob_path).await;
                }
                Err(e.into())
            }
        }
    }

    /// All files, newest first
    pub async fn list(&self) -> FileResult<Vec<StoredFile>> {
        debug!("Fetching files");

        let query = format!(
            "SELECT {} FROM files ORDER BY created_at DESC, id DESC",
            FILE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_file(row)).collect()
    }

    pub async fn get(&self, file_id: i64) -> FileResult<StoredFile> {
        let query = format!("SELECT {} FROM files WHERE id = ?", FILE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(FileError::NotFound(file_id))?;

        self.row_to_file(&row)
    }

    /// The stored bytes of a file
    pub async fn read(&self, file: &StoredFile) -> FileResult<Vec<u8>> {
        match tokio::fs::read(&file.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FileError::MissingBlob(file.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the row, then try to remove its blob
    pub async fn delete(&self, file_id: i64) -> FileResult<()> {
        let file = self.get(file_id).await?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Err(FileError::NotFound(file_id));
        }

        remove_blob(Path::new(&file.path)).await;
        info!("Deleted file {}", file_id);
        Ok(())
    }

    async fn find_by_checksum(&self, checksum: &str) -> FileResult<Option<StoredFile>> {
        let query = format!("SELECT {} FROM files WHERE checksum = ?", FILE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(checksum)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.map(|r| self.row_to_file(&r)).transpose()
    }

    /// Convert a database row to a StoredFile
    fn row_to_file(&self, row: &sqlx::sqlite::SqliteRow) -> FileResult<StoredFile> {
        Ok(StoredFile {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            name: row.try_get("name").map_err(StorageError::Sqlx)?,
            mime: row.try_get("mime").map_err(StorageError::Sqlx)?,
            size: row.try_get("size").map_err(StorageError::Sqlx)?,
            checksum: row.try_get("checksum").map_err(StorageError::Sqlx)?,
            created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
            path: row.try_get("path").map_err(StorageError::Sqlx)?,
        })
    }
}

/// Best-effort blob removal; a blob that is already gone is fine
async fn remove_blob(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed blob {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove blob {}: {}", path.display(), e),
    }
}
