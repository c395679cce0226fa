// ABOUTME: Well-known default lists (Inbox and Notepad)
// ABOUTME: Name-based lookup and get-or-create shared by seeding, repair, and routes

use sqlx::SqliteConnection;
use tracing::info;

use tasklane_core::{INBOX_COLOR, INBOX_LIST_NAME, NOTEPAD_COLOR, NOTEPAD_LIST_NAME};

use crate::StorageResult;

/// A list the system creates on its own when it is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultList {
    pub name: &'static str,
    pub position: i64,
    pub color: &'static str,
    pub is_hidden: bool,
}

pub const INBOX: DefaultList = DefaultList {
    name: INBOX_LIST_NAME,
    position: 0,
    color: INBOX_COLOR,
    is_hidden: false,
};

pub const NOTEPAD: DefaultList = DefaultList {
    name: NOTEPAD_LIST_NAME,
    position: 1,
    color: NOTEPAD_COLOR,
    is_hidden: true,
};

/// Id of the oldest list with exactly this name
pub async fn find_list_id(conn: &mut SqliteConnection, name: &str) -> StorageResult<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM lists WHERE name = ? ORDER BY id LIMIT 1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Look up a default list by name, inserting it when absent.
///
/// Call inside a write transaction so two callers cannot both insert.
pub async fn get_or_create_list(
    conn: &mut SqliteConnection,
    list: &DefaultList,
) -> StorageResult<i64> {
    if let Some(id) = find_list_id(conn, list.name).await? {
        return Ok(id);
    }

    let id = sqlx::query(
        "INSERT INTO lists (name, position, color, is_hidden) VALUES (?, ?, ?, ?)",
    )
    .bind(list.name)
    .bind(list.position)
    .bind(list.color)
    .bind(list.is_hidden)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!("Created default list '{}' (id {})", list.name, id);
    Ok(id)
}
