// ABOUTME: Lenient JSON body extractor
// ABOUTME: Accepts any content type and treats an empty or null body as an empty object

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// JSON request body that never rejects with 415 or 422.
///
/// Browser clients sometimes omit `Content-Type` or send no body at all; both
/// deserialize to `T::default()`. Malformed JSON or a wrongly typed field is a
/// validation error (400).
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::validation(format!("Invalid JSON body: {}", e)))?;
        if value.is_null() {
            return Ok(JsonBody(T::default()));
        }

        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))
    }
}
