// ABOUTME: Dense position primitives for todos within a list
// ABOUTME: Shift, gap-closing, renumbering, and density checks over one connection

use sqlx::SqliteConnection;

use crate::StorageResult;

/// Sort key used when reading a list's todos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoOrder {
    /// Current display order: position, then newest first
    Display,
    /// Newest first, ignoring stored positions (used to repair legacy data)
    Recency,
}

impl TodoOrder {
    fn order_by(self) -> &'static str {
        match self {
            TodoOrder::Display => "position ASC, created_at DESC, id DESC",
            TodoOrder::Recency => "created_at DESC, id DESC",
        }
    }
}

/// Ids of every todo in `list_id`, in the requested order
pub async fn todo_ids(
    conn: &mut SqliteConnection,
    list_id: i64,
    order: TodoOrder,
) -> StorageResult<Vec<i64>> {
    let query = format!(
        "SELECT id FROM todos WHERE list_id = ? ORDER BY {}",
        order.order_by()
    );
    let ids = sqlx::query_scalar(&query)
        .bind(list_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

/// Give `ordered_ids[i]` position `i`
pub async fn assign_positions(
    conn: &mut SqliteConnection,
    ordered_ids: &[i64],
) -> StorageResult<()> {
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE todos SET position = ? WHERE id = ?")
            .bind(position as i64)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Move every todo in the list one slot back, freeing position 0
pub async fn shift_right(conn: &mut SqliteConnection, list_id: i64) -> StorageResult<u64> {
    let result = sqlx::query("UPDATE todos SET position = position + 1 WHERE list_id = ?")
        .bind(list_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Close the hole left at `position` after a todo leaves the list
pub async fn close_gap(
    conn: &mut SqliteConnection,
    list_id: i64,
    position: i64,
) -> StorageResult<u64> {
    let result = sqlx::query(
        "UPDATE todos SET position = position - 1 WHERE list_id = ? AND position > ?",
    )
    .bind(list_id)
    .bind(position)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Renumber a list from 0 by recency (newest first)
pub async fn renumber_by_recency(conn: &mut SqliteConnection, list_id: i64) -> StorageResult<()> {
    let ids = todo_ids(conn, list_id, TodoOrder::Recency).await?;
    assign_positions(conn, &ids).await
}

// n non-null, distinct integer positions with min 0 and max n-1 are exactly {0..n-1}
const NOT_DENSE: &str = r#"
    COUNT(position) <> COUNT(*)
    OR COUNT(DISTINCT position) <> COUNT(*)
    OR MIN(position) <> 0
    OR MAX(position) <> COUNT(*) - 1
"#;

/// Lists whose todo positions are not a dense `0..n-1` sequence
pub async fn lists_needing_renumber(conn: &mut SqliteConnection) -> StorageResult<Vec<i64>> {
    let query = format!(
        "SELECT list_id FROM todos WHERE list_id IS NOT NULL GROUP BY list_id HAVING {} ORDER BY list_id",
        NOT_DENSE
    );
    let ids = sqlx::query_scalar(&query).fetch_all(&mut *conn).await?;
    Ok(ids)
}

/// Whether the todos of a single list form a dense `0..n-1` sequence
pub async fn is_dense(conn: &mut SqliteConnection, list_id: i64) -> StorageResult<bool> {
    let query = format!(
        "SELECT COUNT(*) FROM (SELECT list_id FROM todos WHERE list_id = ? GROUP BY list_id HAVING {})",
        NOT_DENSE
    );
    let dirty: i64 = sqlx::query_scalar(&query)
        .bind(list_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(dirty == 0)
}
