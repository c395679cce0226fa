// ABOUTME: Health, diagnostics, and admin endpoints
// ABOUTME: Health check, database path reporting, and the hide-notepad repair action

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::db::DbState;
use crate::error::ApiResult;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Report which database file this server is using
pub async fn db_path(State(db): State<DbState>) -> impl IntoResponse {
    Json(json!({ "db_path": db.db_path.display().to_string() }))
}

/// Ensure a Notepad list exists and is hidden from the list overview
pub async fn hide_notepad(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    info!("Hiding notepad list");

    db.list_storage.hide_notepad().await?;
    Ok(Json(json!({
        "ok": true,
        "db_path": db.db_path.display().to_string(),
    })))
}
