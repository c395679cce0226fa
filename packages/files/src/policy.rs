// ABOUTME: Upload acceptance rules for attachments
// ABOUTME: Filename sanitization, extension and MIME allow-lists, and content checksums

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::types::{PreparedUpload, Upload};
use crate::{FileError, FileResult};

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".txt", ".pdf", ".png", ".jpg", ".jpeg", ".docx", ".xlsx", ".pptx", ".zip", ".rar",
];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "image/png",
    "image/jpeg",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/zip",
    "application/x-zip-compressed",
    "application/vnd.rar",
    "application/x-rar-compressed",
];

const OCTET_STREAM: &str = "application/octet-stream";

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// Directory components are dropped, whitespace becomes `_`, and anything
/// other than ASCII alphanumerics and `._-` is removed. Leading dots and
/// underscores are trimmed so the result can never be hidden or relative.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lower-cased extension including the dot, e.g. `".pdf"`
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Content type from the filename, then the client's claim, then octet-stream
pub fn detect_mime(name: &str, declared: Option<&str>) -> String {
    if let Some(guess) = mime_guess::from_path(name).first() {
        return guess.essence_str().to_string();
    }

    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() => declared.to_ascii_lowercase(),
        _ => OCTET_STREAM.to_string(),
    }
}

/// Hex-encoded SHA-256 of the content
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Run every acceptance check, in order: name, extension, emptiness, MIME.
pub fn prepare_upload(upload: Upload) -> FileResult<PreparedUpload> {
    let name = upload
        .filename
        .as_deref()
        .and_then(sanitize_filename)
        .ok_or_else(|| FileError::Invalid("Invalid filename".to_string()))?;

    let extension = extension_of(&name).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(FileError::UnsupportedType(format!(
            "Extension not allowed: {}",
            extension
        )));
    }

    if upload.bytes.is_empty() {
        return Err(FileError::Invalid("Empty file".to_string()));
    }

    let mime = detect_mime(&name, upload.declared_mime.as_deref());
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(FileError::UnsupportedType(format!("Unsupported MIME: {}", mime)));
    }

    Ok(PreparedUpload {
        checksum: checksum(&upload.bytes),
        name,
        mime,
        bytes: upload.bytes,
    })
}
