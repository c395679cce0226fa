// ABOUTME: Application error type and its HTTP mapping
// ABOUTME: Converts validation, storage, and file errors into structured JSON responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use tasklane_core::ValidationError;
use tasklane_files::FileError;
use tasklane_storage::StorageError;

/// Main application error type that all handlers return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    /// Wrap errors from the storage packages
    #[error("Storage error")]
    Storage(#[from] StorageError),
}

/// Structured error response format for API consistency
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl AppError {
    /// Convert AppError to appropriate HTTP status code and error code
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Storage(storage_error) => match storage_error {
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
                StorageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                StorageError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SCHEMA_ERROR"),
                StorageError::Io(_) | StorageError::Sqlx(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
                }
            },
        }
    }

    /// Get user-friendly error message (sanitized for external consumption)
    fn to_user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::PayloadTooLarge => "Uploaded file is too large".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Storage(storage_error) => match storage_error {
                StorageError::NotFound(resource) => format!("{} not found", resource),
                StorageError::InvalidInput(msg) => msg.clone(),
                StorageError::Schema(_) | StorageError::Io(_) | StorageError::Sqlx(_) => {
                    "Data storage error".to_string()
                }
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.to_status_and_code().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();
        let user_message = self.to_user_message();

        // Log server-side failures with full context but don't expose details
        match &self {
            AppError::Internal(err) => {
                error!(
                    request_id = %request_id,
                    error = %err,
                    "Internal server error occurred"
                );
            }
            AppError::Storage(storage_error) if status_code.is_server_error() => {
                error!(
                    request_id = %request_id,
                    storage_error = %storage_error,
                    "Storage system error"
                );
            }
            _ => {
                info!(
                    request_id = %request_id,
                    error_code = %error_code,
                    error = %self,
                    "API error response"
                );
            }
        }

        let error_response = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code.to_string(),
                message: user_message,
            },
            request_id,
        };

        let mut response = Json(error_response).into_response();
        *response.status_mut() = status_code;
        response
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::Invalid(msg) => AppError::Validation(msg),
            FileError::UnsupportedType(msg) => AppError::UnsupportedMediaType(msg),
            FileError::NotFound(id) => AppError::NotFound(format!("File {}", id)),
            FileError::MissingBlob(id) => AppError::NotFound(format!("Content of file {}", id)),
            FileError::Io(e) => AppError::Internal(e.into()),
            FileError::Storage(e) => AppError::Storage(e),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}
