// ABOUTME: File attachment type definitions
// ABOUTME: Raw uploads, validated uploads, and stored file metadata

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A file part as received from the client
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub filename: Option<String>,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload that passed every acceptance check
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub name: String,
    pub mime: String,
    pub checksum: String,
    pub bytes: Vec<u8>,
}

impl PreparedUpload {
    /// On-disk blob name: checksum prefix plus the sanitized name
    pub fn blob_name(&self) -> String {
        format!("{}_{}", &self.checksum[..16], self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub id: i64,
    pub name: String,
    pub mime: String,
    pub size: i64,
    pub checksum: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub path: String,
}

/// Result of an upload: the stored row and whether this call created it
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file: StoredFile,
    pub created: bool,
}
