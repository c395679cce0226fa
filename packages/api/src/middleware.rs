// ABOUTME: Per-request schema convergence middleware
// ABOUTME: Runs ensure_schema before any handler touches the database

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use tasklane_storage::ensure_schema;

use crate::db::DbState;
use crate::error::AppError;

/// Converge the schema, then hand the request on. A failure is fatal for the
/// request; the next request simply tries again.
pub async fn schema_middleware(
    State(db): State<DbState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    ensure_schema(&db.pool).await?;
    Ok(next.run(request).await)
}
