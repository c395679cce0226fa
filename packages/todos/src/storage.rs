// ABOUTME: Todo storage layer and ordering engine
// ABOUTME: Insert-at-front, reorder, move-to-list, and compacting delete in write transactions

use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use tasklane_storage::positions::{
    assign_positions, close_gap, shift_right, todo_ids, TodoOrder,
};
use tasklane_storage::{
    begin_immediate, get_or_create_list, DefaultList, StorageError, StorageResult, INBOX, NOTEPAD,
};

use crate::ordering::resolve_order;
use crate::types::{Todo, TodoChanges};

const TODO_COLUMNS: &str = "id, title, COALESCE(done, 0) AS done, list_id, position, created_at";

pub struct TodoStorage {
    pool: SqlitePool,
}

impl TodoStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every todo, grouped by list and in display order within each list
    pub async fn list_all(&self) -> StorageResult<Vec<Todo>> {
        debug!("Fetching all todos");

        let query = format!(
            "SELECT {} FROM todos ORDER BY list_id, position ASC, created_at DESC, id DESC",
            TODO_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_todo(row)).collect()
    }

    /// Todos of one list in display order; empty for an unknown list
    pub async fn list_in_list(&self, list_id: i64) -> StorageResult<Vec<Todo>> {
        debug!("Fetching todos for list: {}", list_id);

        let query = format!(
            "SELECT {} FROM todos WHERE list_id = ? ORDER BY position ASC, created_at DESC, id DESC",
            TODO_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_todo(row)).collect()
    }

    /// Todos of the hidden Notepad list, creating the list if needed
    pub async fn list_notepad(&self) -> StorageResult<Vec<Todo>> {
        let mut tx = begin_immediate(&self.pool).await?;
        let notepad_id = get_or_create_list(&mut tx, &NOTEPAD).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.list_in_list(notepad_id).await
    }

    pub async fn get_todo(&self, todo_id: i64) -> StorageResult<Todo> {
        let query = format!("SELECT {} FROM todos WHERE id = ?", TODO_COLUMNS);
        let row = sqlx::query(&query)
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Todo {}", todo_id)))?;

        self.row_to_todo(&row)
    }

    /// Create a todo at the front of the Inbox
    pub async fn create_in_inbox(&self, title: &str) -> StorageResult<Todo> {
        self.create_in_default_list(&INBOX, title).await
    }

    /// Create a todo at the front of the Notepad
    pub async fn create_in_notepad(&self, title: &str) -> StorageResult<Todo> {
        self.create_in_default_list(&NOTEPAD, title).await
    }

    async fn create_in_default_list(&self, list: &DefaultList, title: &str) -> StorageResult<Todo> {
        let mut tx = begin_immediate(&self.pool).await?;
        let list_id = get_or_create_list(&mut tx, list).await?;
        let todo_id = insert_at_front(&mut tx, list_id, title).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_todo(todo_id).await
    }

    /// Create a todo at position 0 of an existing list, shifting the rest back
    pub async fn insert_at_front(&self, list_id: i64, title: &str) -> StorageResult<Todo> {
        let mut tx = begin_immediate(&self.pool).await?;

        if !list_exists(&mut tx, list_id).await? {
            return Err(StorageError::NotFound(format!("List {}", list_id)));
        }
        let todo_id = insert_at_front(&mut tx, list_id, title).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_todo(todo_id).await
    }

    /// Renumber a list from a client-proposed order.
    ///
    /// Unknown ids are dropped and omitted members keep their relative order
    /// after the proposed ones. An unknown list has no members, so nothing
    /// changes.
    pub async fn reorder(&self, list_id: i64, proposed: &[i64]) -> StorageResult<()> {
        debug!("Reordering list {} ({} ids proposed)", list_id, proposed.len());

        let mut tx = begin_immediate(&self.pool).await?;
        let existing = todo_ids(&mut tx, list_id, TodoOrder::Display).await?;
        let order = resolve_order(proposed, &existing);
        assign_positions(&mut tx, &order).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Apply validated changes to a todo.
    ///
    /// Moving to another list closes the gap in the source list and places the
    /// todo at the front of the destination, so both stay dense.
    pub async fn update(&self, todo_id: i64, changes: TodoChanges) -> StorageResult<Todo> {
        debug!("Updating todo: {}", todo_id);

        if changes.is_empty() {
            return Err(StorageError::InvalidInput("No fields to update".to_string()));
        }

        let mut tx = begin_immediate(&self.pool).await?;
        let (source_list, position) = locate(&mut tx, todo_id).await?;

        if let Some(destination) = changes.list_id.filter(|id| *id != source_list) {
            if !list_exists(&mut tx, destination).await? {
                return Err(StorageError::InvalidInput(format!(
                    "List {} does not exist",
                    destination
                )));
            }

            close_gap(&mut tx, source_list, position).await?;
            shift_right(&mut tx, destination).await?;
            sqlx::query("UPDATE todos SET list_id = ?, position = 0 WHERE id = ?")
                .bind(destination)
                .bind(todo_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

            info!("Moved todo {} from list {} to list {}", todo_id, source_list, destination);
        }

        if let Some(title) = changes.title {
            sqlx::query("UPDATE todos SET title = ? WHERE id = ?")
                .bind(title)
                .bind(todo_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        if let Some(done) = changes.done {
            sqlx::query("UPDATE todos SET done = ? WHERE id = ?")
                .bind(done)
                .bind(todo_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        self.get_todo(todo_id).await
    }

    /// Delete a todo and close the gap it leaves in its list
    pub async fn delete(&self, todo_id: i64) -> StorageResult<()> {
        debug!("Deleting todo: {}", todo_id);

        let mut tx = begin_immediate(&self.pool).await?;
        let (list_id, position) = locate(&mut tx, todo_id).await?;

        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(todo_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        close_gap(&mut tx, list_id, position).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(())
    }

    /// Convert a database row to a Todo
    fn row_to_todo(&self, row: &sqlx::sqlite::SqliteRow) -> StorageResult<Todo> {
        Ok(Todo {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            title: row.try_get("title").map_err(StorageError::Sqlx)?,
            done: row.try_get("done").map_err(StorageError::Sqlx)?,
            list_id: row.try_get("list_id").map_err(StorageError::Sqlx)?,
            position: row.try_get("position").map_err(StorageError::Sqlx)?,
            created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        })
    }
}

/// Shift the list right and insert the new todo at position 0
async fn insert_at_front(
    conn: &mut SqliteConnection,
    list_id: i64,
    title: &str,
) -> StorageResult<i64> {
    shift_right(conn, list_id).await?;

    let todo_id = sqlx::query("INSERT INTO todos (title, done, list_id, position) VALUES (?, 0, ?, 0)")
        .bind(title)
        .bind(list_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .last_insert_rowid();

    debug!("Inserted todo {} at front of list {}", todo_id, list_id);
    Ok(todo_id)
}

async fn list_exists(conn: &mut SqliteConnection, list_id: i64) -> StorageResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lists WHERE id = ?)")
        .bind(list_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(exists)
}

/// Current list and position of a todo
async fn locate(conn: &mut SqliteConnection, todo_id: i64) -> StorageResult<(i64, i64)> {
    sqlx::query_as("SELECT list_id, position FROM todos WHERE id = ?")
        .bind(todo_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::NotFound(format!("Todo {}", todo_id)))
}
