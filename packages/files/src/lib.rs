// ABOUTME: Content-addressed file attachments for Tasklane
// ABOUTME: Upload validation, SHA-256 de-duplication, blob storage, and file metadata

use thiserror::Error;

use tasklane_storage::StorageError;

pub mod policy;
pub mod storage;
pub mod types;

pub use policy::{checksum, detect_mime, sanitize_filename, ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES};
pub use storage::FileStorage;
pub use types::{PreparedUpload, StoredFile, Upload, UploadOutcome};

/// File store errors
#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    UnsupportedType(String),
    #[error("File {0} not found")]
    NotFound(i64),
    #[error("Stored content for file {0} is missing")]
    MissingBlob(i64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type FileResult<T> = Result<T, FileError>;
