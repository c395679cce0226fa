// ABOUTME: HTTP request handlers for list operations
// ABOUTME: List CRUD plus the per-list todo routes (insert-at-front and reorder)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use tasklane_lists::{ListCreateInput, ListUpdateInput};
use tasklane_todos::{ReorderInput, TodoCreateInput};

use crate::db::DbState;
use crate::error::ApiResult;
use crate::extract::JsonBody;

/// List visible lists
pub async fn list_lists(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    info!("Listing lists");

    let lists = db.list_storage.list_visible().await?;
    Ok(Json(lists))
}

/// Create a new list
pub async fn create_list(
    State(db): State<DbState>,
    JsonBody(input): JsonBody<ListCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let new_list = input.validate()?;
    info!("Creating list: {}", new_list.name);

    let list = db.list_storage.create_list(new_list).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Update name, position, or color of a list
pub async fn update_list(
    State(db): State<DbState>,
    Path(list_id): Path<i64>,
    JsonBody(input): JsonBody<ListUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let changes = input.into_changes()?;
    info!("Updating list: {}", list_id);

    let list = db.list_storage.update_list(list_id, changes).await?;
    Ok(Json(list))
}

/// Delete a list and all of its todos
pub async fn delete_list(
    State(db): State<DbState>,
    Path(list_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting list: {}", list_id);

    db.list_storage.delete_list(list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Todos of one list in display order
pub async fn list_todos_in_list(
    State(db): State<DbState>,
    Path(list_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("Listing todos for list: {}", list_id);

    let todos = db.todo_storage.list_in_list(list_id).await?;
    Ok(Json(todos))
}

/// Create a todo at the front of a list
pub async fn create_todo_in_list(
    State(db): State<DbState>,
    Path(list_id): Path<i64>,
    JsonBody(input): JsonBody<TodoCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let title = input.validate()?;
    info!("Creating todo in list: {}", list_id);

    let todo = db.todo_storage.insert_at_front(list_id, &title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Apply a client-proposed order to a list's todos
pub async fn reorder_todos(
    State(db): State<DbState>,
    Path(list_id): Path<i64>,
    JsonBody(input): JsonBody<ReorderInput>,
) -> ApiResult<impl IntoResponse> {
    let order = input.ids()?;
    info!("Reordering list {} ({} ids)", list_id, order.len());

    db.todo_storage.reorder(list_id, &order).await?;
    Ok(Json(json!({ "ok": true })))
}
