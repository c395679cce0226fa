// ABOUTME: HTTP request handlers for the hidden Notepad list
// ABOUTME: Scratch-space todos that never show up in the list overview

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use tasklane_todos::TodoCreateInput;

use crate::db::DbState;
use crate::error::ApiResult;
use crate::extract::JsonBody;

pub async fn list_notepad(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    info!("Listing notepad");

    let todos = db.todo_storage.list_notepad().await?;
    Ok(Json(todos))
}

pub async fn create_note(
    State(db): State<DbState>,
    JsonBody(input): JsonBody<TodoCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let title = input.validate()?;
    info!("Creating notepad entry");

    let todo = db.todo_storage.create_in_notepad(&title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}
