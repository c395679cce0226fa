// ABOUTME: HTTP request handlers for file attachments
// ABOUTME: Multipart upload, listing, conditional download, and delete

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use tasklane_files::Upload;

use crate::db::DbState;
use crate::error::{ApiResult, AppError};

/// Form field that carries the uploaded file
const FILE_FIELD: &str = "file";

/// Store an uploaded file, returning the existing row for known content
pub async fn upload_file(
    State(db): State<DbState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart.map_err(|_| AppError::validation("No file provided"))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let declared_mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(Upload {
            filename,
            declared_mime,
            bytes: bytes.to_vec(),
        });
        break;
    }
    let upload = upload.ok_or_else(|| AppError::validation("No file provided"))?;

    let outcome = db.file_storage.upload(upload).await?;
    let file = outcome.file;
    info!("Upload resolved to file {} (new: {})", file.id, outcome.created);

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(json!({
            "ok": true,
            "id": file.id,
            "name": file.name,
            "mime": file.mime,
            "size": file.size,
            "checksum": file.checksum,
        })),
    ))
}

/// List stored files, newest first
pub async fn list_files(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    info!("Listing files");

    let files = db.file_storage.list().await?;
    Ok(Json(files))
}

/// Send a file as an attachment; answers 304 when the client already has it
pub async fn download_file(
    State(db): State<DbState>,
    Path(file_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let file = db.file_storage.get(file_id).await?;
    let etag = format!("\"{}\"", file.checksum);

    let cached = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| etag_matches(value, &file.checksum));
    if cached {
        debug!("File {} not modified", file_id);
        return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response());
    }

    let bytes = db.file_storage.read(&file).await?;
    info!("Sending file {} ({} bytes)", file_id, bytes.len());

    let headers = [
        (CONTENT_TYPE, file.mime.clone()),
        (CONTENT_LENGTH, bytes.len().to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.name),
        ),
        (ETAG, etag),
    ];
    Ok((headers, bytes).into_response())
}

/// Delete a file row and, best effort, its blob
pub async fn delete_file(
    State(db): State<DbState>,
    Path(file_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting file: {}", file_id);

    db.file_storage.delete(file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::validation(err.body_text())
    }
}

/// Whether an `If-None-Match` header value names this checksum.
///
/// Accepts `*`, comma-separated lists, weak validators, and quoted or bare tags.
pub fn etag_matches(if_none_match: &str, checksum: &str) -> bool {
    if if_none_match.trim() == "*" {
        return true;
    }

    if_none_match.split(',').any(|tag| {
        let tag = tag.trim();
        let tag = tag.strip_prefix("W/").unwrap_or(tag);
        tag.trim_matches('"') == checksum
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_etag_matches_plain_and_quoted() {
        assert!(etag_matches(SUM, SUM));
        assert!(etag_matches(&format!("\"{}\"", SUM), SUM));
        assert!(etag_matches(&format!("W/\"{}\"", SUM), SUM));
    }

    #[test]
    fn test_etag_matches_lists_and_wildcard() {
        assert!(etag_matches(&format!("\"abc\", \"{}\"", SUM), SUM));
        assert!(etag_matches(" * ", SUM));
    }

    #[test]
    fn test_etag_mismatch() {
        assert!(!etag_matches("\"abc\"", SUM));
        assert!(!etag_matches("", SUM));
        assert!(!etag_matches(&SUM[..16], SUM));
    }
}
