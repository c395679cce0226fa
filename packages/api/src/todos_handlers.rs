// ABOUTME: HTTP request handlers for todo operations
// ABOUTME: Lists, creates (into the Inbox), updates, moves, and deletes todos

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use tasklane_todos::{TodoCreateInput, TodoUpdateInput};

use crate::db::DbState;
use crate::error::ApiResult;
use crate::extract::JsonBody;

/// List every todo, grouped by list
pub async fn list_todos(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    info!("Listing all todos");

    let todos = db.todo_storage.list_all().await?;
    Ok(Json(todos))
}

/// Create a todo at the front of the Inbox
pub async fn create_todo(
    State(db): State<DbState>,
    JsonBody(input): JsonBody<TodoCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let title = input.validate()?;
    info!("Creating todo in Inbox");

    let todo = db.todo_storage.create_in_inbox(&title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Update title, completion, or owning list of a todo
pub async fn update_todo(
    State(db): State<DbState>,
    Path(todo_id): Path<i64>,
    JsonBody(input): JsonBody<TodoUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let changes = input.into_changes()?;
    info!("Updating todo: {}", todo_id);

    let todo = db.todo_storage.update(todo_id, changes).await?;
    Ok(Json(todo))
}

/// Delete a todo
pub async fn delete_todo(
    State(db): State<DbState>,
    Path(todo_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting todo: {}", todo_id);

    db.todo_storage.delete(todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
