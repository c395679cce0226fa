// ABOUTME: List storage layer using SQLite
// ABOUTME: Handles CRUD for lists, cascading deletes, and the well-known default lists

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use tasklane_storage::{
    begin_immediate, get_or_create_list, StorageError, StorageResult, NOTEPAD,
};

use crate::types::{List, ListChanges, NewList};

const LIST_COLUMNS: &str =
    "id, name, position, color, COALESCE(is_hidden, 0) AS is_hidden, created_at";

pub struct ListStorage {
    pool: SqlitePool,
}

impl ListStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists shown to clients: hidden lists excluded, ordered by position then id
    pub async fn list_visible(&self) -> StorageResult<Vec<List>> {
        debug!("Fetching visible lists");

        let query = format!(
            "SELECT {} FROM lists WHERE COALESCE(is_hidden, 0) = 0 ORDER BY position, id",
            LIST_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(|row| self.row_to_list(row)).collect()
    }

    /// Get a single list by ID, hidden or not
    pub async fn get_list(&self, list_id: i64) -> StorageResult<List> {
        debug!("Fetching list: {}", list_id);

        let query = format!("SELECT {} FROM lists WHERE id = ?", LIST_COLUMNS);
        let row = sqlx::query(&query)
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("List {}", list_id)))?;

        self.row_to_list(&row)
    }

    /// Create a new list at position 0
    pub async fn create_list(&self, input: NewList) -> StorageResult<List> {
        debug!("Creating list: {}", input.name);

        let list_id = sqlx::query("INSERT INTO lists (name, position, color) VALUES (?, 0, ?)")
            .bind(&input.name)
            .bind(&input.color)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .last_insert_rowid();

        self.get_list(list_id).await
    }

    /// Apply validated changes to a list
    pub async fn update_list(&self, list_id: i64, changes: ListChanges) -> StorageResult<List> {
        debug!("Updating list: {}", list_id);

        if changes.is_empty() {
            return Err(StorageError::InvalidInput("No fields to update".to_string()));
        }

        // Column names are fixed; only values are bound
        let mut query_parts = Vec::new();
        if changes.name.is_some() {
            query_parts.push("name = ?");
        }
        if changes.position.is_some() {
            query_parts.push("position = ?");
        }
        if changes.color.is_some() {
            query_parts.push("color = ?");
        }

        let query_str = format!("UPDATE lists SET {} WHERE id = ?", query_parts.join(", "));
        let mut query = sqlx::query(&query_str);

        // Bind parameters in the same order
        if let Some(name) = changes.name {
            query = query.bind(name);
        }
        if let Some(position) = changes.position {
            query = query.bind(position);
        }
        if let Some(color) = changes.color {
            query = query.bind(color);
        }

        let result = query
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("List {}", list_id)));
        }

        self.get_list(list_id).await
    }

    /// Delete a list together with every todo in it
    pub async fn delete_list(&self, list_id: i64) -> StorageResult<()> {
        debug!("Deleting list: {}", list_id);

        let mut tx = begin_immediate(&self.pool).await?;

        let todos = sqlx::query("DELETE FROM todos WHERE list_id = ?")
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .rows_affected();

        let result = sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the todo delete
            return Err(StorageError::NotFound(format!("List {}", list_id)));
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        info!("Deleted list {} and {} todos", list_id, todos);
        Ok(())
    }

    /// Make sure a Notepad list exists and that every list named like it is hidden.
    ///
    /// The name match is case-insensitive. Returns the id of the oldest match.
    pub async fn hide_notepad(&self) -> StorageResult<i64> {
        let mut tx = begin_immediate(&self.pool).await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM lists WHERE lower(name) = lower(?) ORDER BY id LIMIT 1")
                .bind(NOTEPAD.name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE lists SET is_hidden = 1 WHERE lower(name) = lower(?)")
                    .bind(NOTEPAD.name)
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::Sqlx)?;
                id
            }
            None => get_or_create_list(&mut tx, &NOTEPAD).await?,
        };

        tx.commit().await.map_err(StorageError::Sqlx)?;
        info!("Notepad list {} is hidden", id);
        Ok(id)
    }

    /// Convert a database row to a List
    fn row_to_list(&self, row: &sqlx::sqlite::SqliteRow) -> StorageResult<List> {
        Ok(List {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            name: row.try_get("name").map_err(StorageError::Sqlx)?,
            position: row.try_get("position").map_err(StorageError::Sqlx)?,
            color: row.try_get("color").map_err(StorageError::Sqlx)?,
            is_hidden: row.try_get("is_hidden").map_err(StorageError::Sqlx)?,
            created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        })
    }
}
