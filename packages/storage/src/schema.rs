// ABOUTME: Idempotent schema convergence run before every request
// ABOUTME: Declarative target-schema diff, ledgered migration ladder, and data repair

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::defaults::{get_or_create_list, find_list_id, INBOX, NOTEPAD};
use crate::pool::begin_immediate;
use crate::positions::{lists_needing_renumber, renumber_by_recency};
use crate::{StorageError, StorageResult};

/// One column of the target schema
#[derive(Debug)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// Definition for `ALTER TABLE ... ADD COLUMN`; `None` when the column can
    /// only come from `CREATE TABLE` (primary keys)
    pub add_definition: Option<&'static str>,
}

/// One table of the target schema
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub create_sql: &'static str,
    pub columns: &'static [ColumnSpec],
    pub indexes: &'static [&'static str],
}

const fn column(name: &'static str, add_definition: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        add_definition: Some(add_definition),
    }
}

const PRIMARY_KEY: ColumnSpec = ColumnSpec {
    name: "id",
    add_definition: None,
};

const LISTS_TABLE: TableSpec = TableSpec {
    name: "lists",
    create_sql: r#"
        CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            color TEXT,
            is_hidden INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
    "#,
    columns: &[
        PRIMARY_KEY,
        column("name", "name TEXT NOT NULL DEFAULT ''"),
        column("position", "position INTEGER NOT NULL DEFAULT 0"),
        column("color", "color TEXT"),
        column("is_hidden", "is_hidden INTEGER NOT NULL DEFAULT 0"),
        column("created_at", "created_at DATETIME"),
    ],
    indexes: &["CREATE INDEX IF NOT EXISTS idx_lists_name ON lists(name)"],
};

const TODOS_TABLE: TableSpec = TableSpec {
    name: "todos",
    create_sql: r#"
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            done INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
            list_id INTEGER REFERENCES lists(id),
            position INTEGER NOT NULL DEFAULT 0
        )
    "#,
    columns: &[
        PRIMARY_KEY,
        column("title", "title TEXT NOT NULL DEFAULT ''"),
        column("done", "done INTEGER NOT NULL DEFAULT 0"),
        column("created_at", "created_at DATETIME"),
        column("list_id", "list_id INTEGER REFERENCES lists(id)"),
        column("position", "position INTEGER NOT NULL DEFAULT 0"),
    ],
    indexes: &["CREATE INDEX IF NOT EXISTS idx_todos_list_position ON todos(list_id, position)"],
};

const FILES_TABLE: TableSpec = TableSpec {
    name: "files",
    create_sql: r#"
        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            mime TEXT,
            size INTEGER NOT NULL DEFAULT 0,
            path TEXT NOT NULL,
            checksum TEXT NOT NULL UNIQUE,
            created_at DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
    "#,
    columns: &[
        PRIMARY_KEY,
        column("name", "name TEXT NOT NULL DEFAULT ''"),
        column("mime", "mime TEXT"),
        column("size", "size INTEGER NOT NULL DEFAULT 0"),
        column("path", "path TEXT NOT NULL DEFAULT ''"),
        column("checksum", "checksum TEXT"),
        column("created_at", "created_at DATETIME"),
    ],
    // Stores created before checksum existed get uniqueness from the index
    indexes: &["CREATE UNIQUE INDEX IF NOT EXISTS idx_files_checksum ON files(checksum)"],
};

/// The current logical schema. Lists come first: todos reference them.
pub const TARGET_SCHEMA: &[TableSpec] = &[LISTS_TABLE, TODOS_TABLE, FILES_TABLE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    TargetSchema,
    DefaultLists,
}

/// A ledgered, run-once migration step
#[derive(Debug)]
pub struct Migration {
    pub id: &'static str,
    pub description: &'static str,
    step: Step,
}

/// All migrations in the order they must run
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "0001_target_schema",
        description: "Create tables and add columns missing from older stores",
        step: Step::TargetSchema,
    },
    Migration {
        id: "0002_default_lists",
        description: "Seed the Inbox and hidden Notepad lists",
        step: Step::DefaultLists,
    },
];

const LEDGER_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        id TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )
"#;

const ORPHAN_FILTER: &str = "list_id IS NULL OR list_id NOT IN (SELECT id FROM lists)";

/// What a convergence pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub applied_migrations: Vec<&'static str>,
    pub created_tables: Vec<&'static str>,
    pub added_columns: Vec<String>,
    pub seeded_lists: Vec<&'static str>,
    pub orphans_reassigned: u64,
    pub lists_renumbered: Vec<i64>,
}

impl SchemaReport {
    pub fn is_noop(&self) -> bool {
        self == &SchemaReport::default()
    }
}

/// Bring the store to the current schema and repair legacy data.
///
/// Safe to call on every request: a read-only check returns early when the
/// store is already converged. Otherwise all work happens in one
/// `BEGIN IMMEDIATE` transaction and is re-checked under the write lock, so
/// concurrent callers never double-seed or observe a half-applied state.
pub async fn ensure_schema(pool: &SqlitePool) -> StorageResult<SchemaReport> {
    {
        let mut conn = pool.acquire().await?;
        if is_converged(&mut conn).await? {
            return Ok(SchemaReport::default());
        }
    }

    let mut tx = begin_immediate(pool).await?;
    let report = converge(&mut tx).await?;
    tx.commit().await?;

    if !report.is_noop() {
        info!(
            migrations = ?report.applied_migrations,
            added_columns = ?report.added_columns,
            seeded = ?report.seeded_lists,
            orphans = report.orphans_reassigned,
            renumbered = ?report.lists_renumbered,
            "Schema converged"
        );
    }

    Ok(report)
}

/// Cheap read-only check that every migration is recorded and no repair is due
async fn is_converged(conn: &mut SqliteConnection) -> StorageResult<bool> {
    if !table_exists(conn, "schema_migrations").await? {
        return Ok(false);
    }

    let applied = applied_migrations(conn).await?;
    if MIGRATIONS.iter().any(|m| !applied.contains(m.id)) {
        return Ok(false);
    }

    for table in TARGET_SCHEMA {
        if !table_exists(conn, table.name).await? {
            return Ok(false);
        }
    }

    Ok(count_orphans(conn).await? == 0 && lists_needing_renumber(conn).await?.is_empty())
}

/// Apply pending migrations, verify structure, then repair data
async fn converge(conn: &mut SqliteConnection) -> StorageResult<SchemaReport> {
    let mut report = SchemaReport::default();

    sqlx::query(LEDGER_SQL).execute(&mut *conn).await?;
    let applied = applied_migrations(conn).await?;

    for migration in MIGRATIONS {
        if applied.contains(migration.id) {
            continue;
        }

        debug!("Applying migration {}", migration.id);
        match migration.step {
            Step::TargetSchema => converge_tables(conn, &mut report).await?,
            Step::DefaultLists => seed_default_lists(conn, &mut report).await?,
        }

        sqlx::query("INSERT OR IGNORE INTO schema_migrations (id, description) VALUES (?, ?)")
            .bind(migration.id)
            .bind(migration.description)
            .execute(&mut *conn)
            .await?;
        report.applied_migrations.push(migration.id);
    }

    verify_target_schema(conn).await?;
    repair_todos(conn, &mut report).await?;

    Ok(report)
}

/// Diff every target table against `PRAGMA table_info` and add what is missing
async fn converge_tables(
    conn: &mut SqliteConnection,
    report: &mut SchemaReport,
) -> StorageResult<()> {
    for table in TARGET_SCHEMA {
        if !table_exists(conn, table.name).await? {
            sqlx::query(table.create_sql).execute(&mut *conn).await?;
            report.created_tables.push(table.name);
            debug!("Created table {}", table.name);
        }

        let existing = table_columns(conn, table.name).await?;
        for column in table.columns {
            if existing.contains(column.name) {
                continue;
            }
            let Some(definition) = column.add_definition else {
                return Err(StorageError::Schema(format!(
                    "table '{}' has no '{}' column and it cannot be added in place",
                    table.name, column.name
                )));
            };
            add_column(conn, table.name, definition).await?;
            report
                .added_columns
                .push(format!("{}.{}", table.name, column.name));
        }

        for index in table.indexes {
            sqlx::query(index).execute(&mut *conn).await?;
        }
    }

    // A freshly added flag defaults to visible; an existing Notepad stays hidden
    if report.added_columns.iter().any(|c| c == "lists.is_hidden") {
        let hidden = sqlx::query("UPDATE lists SET is_hidden = 1 WHERE name = ?")
            .bind(NOTEPAD.name)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        debug!("Hid {} existing Notepad list(s)", hidden);
    }

    Ok(())
}

async fn add_column(
    conn: &mut SqliteConnection,
    table: &str,
    definition: &str,
) -> StorageResult<()> {
    // Identifiers come from TARGET_SCHEMA, never from user input
    let statement = format!("ALTER TABLE {} ADD COLUMN {}", table, definition);
    match sqlx::query(&statement).execute(&mut *conn).await {
        Ok(_) => {
            info!("Added column: {}", statement);
            Ok(())
        }
        // Another writer got there first
        Err(sqlx::Error::Database(e)) if e.message().contains("duplicate column name") => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Insert each default list whose name is not already taken
async fn seed_default_lists(
    conn: &mut SqliteConnection,
    report: &mut SchemaReport,
) -> StorageResult<()> {
    for list in [INBOX, NOTEPAD] {
        if find_list_id(conn, list.name).await?.is_none() {
            get_or_create_list(conn, &list).await?;
            report.seeded_lists.push(list.name);
        }
    }
    Ok(())
}

/// Fail when a target table or column is still missing after convergence
async fn verify_target_schema(conn: &mut SqliteConnection) -> StorageResult<()> {
    for table in TARGET_SCHEMA {
        if !table_exists(conn, table.name).await? {
            return Err(StorageError::Schema(format!(
                "required table '{}' is missing",
                table.name
            )));
        }

        let existing = table_columns(conn, table.name).await?;
        let missing: Vec<&str> = table
            .columns
            .iter()
            .map(|c| c.name)
            .filter(|name| !existing.contains(*name))
            .collect();

        if !missing.is_empty() {
            return Err(StorageError::Schema(format!(
                "table '{}' is missing columns: {}",
                table.name,
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

/// Move orphaned todos to Inbox, then renumber every non-dense list
async fn repair_todos(conn: &mut SqliteConnection, report: &mut SchemaReport) -> StorageResult<()> {
    if count_orphans(conn).await? > 0 {
        let inbox_id = get_or_create_list(conn, &INBOX).await?;
        let query = format!("UPDATE todos SET list_id = ? WHERE {}", ORPHAN_FILTER);
        let result = sqlx::query(&query)
            .bind(inbox_id)
            .execute(&mut *conn)
            .await?;
        report.orphans_reassigned = result.rows_affected();
    }

    for list_id in lists_needing_renumber(conn).await? {
        renumber_by_recency(conn, list_id).await?;
        report.lists_renumbered.push(list_id);
    }

    Ok(())
}

async fn count_orphans(conn: &mut SqliteConnection) -> StorageResult<i64> {
    let query = format!("SELECT COUNT(*) FROM todos WHERE {}", ORPHAN_FILTER);
    let count = sqlx::query_scalar(&query).fetch_one(&mut *conn).await?;
    Ok(count)
}

async fn table_exists(conn: &mut SqliteConnection, table: &str) -> StorageResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

async fn table_columns(conn: &mut SqliteConnection, table: &str) -> StorageResult<HashSet<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(names.into_iter().collect())
}

async fn applied_migrations(conn: &mut SqliteConnection) -> StorageResult<HashSet<String>> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM schema_migrations")
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids.into_iter().collect())
}
