// ABOUTME: HTTP API layer for Tasklane providing REST endpoints and routing
// ABOUTME: Integration layer that depends on the list, todo, and file packages

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

pub mod db;
pub mod error;
pub mod extract;
pub mod files_handlers;
pub mod lists_handlers;
pub mod middleware;
pub mod notepad_handlers;
pub mod system_handlers;
pub mod todos_handlers;

pub use db::DbState;
pub use error::{ApiResult, AppError};

/// Default request body limit for uploads (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Creates the todos API router
pub fn create_todos_router() -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(todos_handlers::list_todos).post(todos_handlers::create_todo),
        )
        .route(
            "/{id}",
            patch(todos_handlers::update_todo).delete(todos_handlers::delete_todo),
        )
}

/// Creates the lists API router, including per-list todo routes
pub fn create_lists_router() -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(lists_handlers::list_lists).post(lists_handlers::create_list),
        )
        .route(
            "/{id}",
            patch(lists_handlers::update_list).delete(lists_handlers::delete_list),
        )
        .route(
            "/{id}/todos",
            get(lists_handlers::list_todos_in_list).post(lists_handlers::create_todo_in_list),
        )
        .route("/{id}/todos/reorder", post(lists_handlers::reorder_todos))
}

/// Creates the notepad API router
pub fn create_notepad_router() -> Router<DbState> {
    Router::new().route(
        "/",
        get(notepad_handlers::list_notepad).post(notepad_handlers::create_note),
    )
}

/// Creates the files API router with its own body limit
pub fn create_files_router(max_upload_bytes: usize) -> Router<DbState> {
    Router::new()
        .route(
            "/",
            get(files_handlers::list_files).post(files_handlers::upload_file),
        )
        .route(
            "/{id}",
            get(files_handlers::download_file).delete(files_handlers::delete_file),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Assemble the full application under `/api`.
///
/// Every request first converges the schema, so a store that was swapped or
/// damaged while the server ran is repaired before any handler reads it.
pub fn create_router(state: DbState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/health", get(system_handlers::health_check))
        .route("/debug/db-path", get(system_handlers::db_path))
        .route("/admin/hide-notepad", post(system_handlers::hide_notepad))
        .nest("/todos", create_todos_router())
        .nest("/lists", create_lists_router())
        .nest("/notepad", create_notepad_router())
        .nest("/files", create_files_router(max_upload_bytes));

    Router::new()
        .nest("/api", api)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::schema_middleware,
        ))
        .with_state(state)
}
