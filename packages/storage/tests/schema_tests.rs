// ABOUTME: Integration tests for schema convergence
// ABOUTME: Covers fresh bootstrap, legacy upgrades, seeding, backfill, and concurrency

use pretty_assertions::assert_eq;
use sqlx::SqlitePool;
use tasklane_storage::{connect, connect_in_memory, ensure_schema, StorageConfig, StorageError};
use tempfile::TempDir;

async fn list_names(pool: &SqlitePool) -> Vec<(String, bool)> {
    sqlx::query_as("SELECT name, is_hidden FROM lists ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

async fn positions_by_title(pool: &SqlitePool, list_id: i64) -> Vec<(String, i64)> {
    sqlx::query_as("SELECT title, position FROM todos WHERE list_id = ? ORDER BY position")
        .bind(list_id)
        .fetch_all(pool)
        .await
        .unwrap()
}

async fn inbox_id(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT id FROM lists WHERE name = 'Inbox'")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Tables as the very first release created them: no colors, no hidden flag,
/// todos without list or position.
async fn create_first_release_tables(pool: &SqlitePool) {
    sqlx::query(
        r#"
        CREATE TABLE lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            done INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_fresh_store_gets_tables_and_default_lists() {
    let pool = connect_in_memory().await.unwrap();

    let report = ensure_schema(&pool).await.unwrap();

    assert_eq!(report.created_tables, vec!["lists", "todos", "files"]);
    assert_eq!(report.seeded_lists, vec!["Inbox", "Notepad"]);
    assert_eq!(
        report.applied_migrations,
        vec!["0001_target_schema", "0002_default_lists"]
    );
    assert_eq!(
        list_names(&pool).await,
        vec![("Inbox".to_string(), false), ("Notepad".to_string(), true)]
    );
}

#[tokio::test]
async fn test_repeated_bootstrap_seeds_exactly_once() {
    let pool = connect_in_memory().await.unwrap();

    for _ in 0..5 {
        ensure_schema(&pool).await.unwrap();
    }

    let inbox: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE name = 'Inbox'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let notepad: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE name = 'Notepad'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((inbox, notepad), (1, 1));
}

#[tokio::test]
async fn test_converged_store_is_a_noop() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();

    let report = ensure_schema(&pool).await.unwrap();
    assert!(report.is_noop(), "unexpected changes: {:?}", report);
}

#[tokio::test]
async fn test_deleted_notepad_is_not_reseeded() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();

    sqlx::query("DELETE FROM lists WHERE name = 'Notepad'")
        .execute(&pool)
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();

    assert_eq!(list_names(&pool).await, vec![("Inbox".to_string(), false)]);
}

#[tokio::test]
async fn test_partial_prior_seeding_is_completed_without_duplicates() {
    let pool = connect_in_memory().await.unwrap();
    create_first_release_tables(&pool).await;
    sqlx::query("INSERT INTO lists (name, position) VALUES ('Notepad', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let report = ensure_schema(&pool).await.unwrap();

    assert_eq!(report.seeded_lists, vec!["Inbox"]);
    let names: Vec<String> = list_names(&pool).await.into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["Notepad".to_string(), "Inbox".to_string()]);
}

#[tokio::test]
async fn test_legacy_store_gains_missing_columns_without_losing_rows() {
    let pool = connect_in_memory().await.unwrap();
    create_first_release_tables(&pool).await;
    sqlx::query("INSERT INTO lists (name) VALUES ('Work')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO todos (title, done) VALUES ('legacy', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let report = ensure_schema(&pool).await.unwrap();

    assert_eq!(report.created_tables, vec!["files"]);
    assert_eq!(
        report.added_columns,
        vec![
            "lists.color".to_string(),
            "lists.is_hidden".to_string(),
            "todos.list_id".to_string(),
            "todos.position".to_string(),
        ]
    );

    let (title, done): (String, bool) = sqlx::query_as("SELECT title, done FROM todos")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((title.as_str(), done), ("legacy", true));

    let work_hidden: bool = sqlx::query_scalar("SELECT is_hidden FROM lists WHERE name = 'Work'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!work_hidden);
}

#[tokio::test]
async fn test_existing_notepad_is_hidden_when_flag_is_added() {
    let pool = connect_in_memory().await.unwrap();
    create_first_release_tables(&pool).await;
    sqlx::query("INSERT INTO lists (name, position) VALUES ('Inbox', 0), ('Notepad', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let report = ensure_schema(&pool).await.unwrap();

    assert!(report.added_columns.contains(&"lists.is_hidden".to_string()));
    assert!(report.seeded_lists.is_empty());
    assert_eq!(
        list_names(&pool).await,
        vec![("Inbox".to_string(), false), ("Notepad".to_string(), true)]
    );
}

#[tokio::test]
async fn test_orphaned_todos_move_to_inbox() {
    let pool = connect_in_memory().await.unwrap();
    create_first_release_tables(&pool).await;
    sqlx::query("INSERT INTO todos (title) VALUES ('orphan one'), ('orphan two')")
        .execute(&pool)
        .await
        .unwrap();

    let report = ensure_schema(&pool).await.unwrap();
    assert_eq!(report.orphans_reassigned, 2);

    let inbox = inbox_id(&pool).await;
    let null_lists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE list_id IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(null_lists, 0);

    let in_inbox: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE list_id = ?")
        .bind(inbox)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(in_inbox, 2);
}

#[tokio::test]
async fn test_null_list_after_convergence_is_backfilled_on_next_pass() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();

    sqlx::query("INSERT INTO todos (title, list_id, position) VALUES ('stray', NULL, 0)")
        .execute(&pool)
        .await
        .unwrap();

    let report = ensure_schema(&pool).await.unwrap();
    assert_eq!(report.orphans_reassigned, 1);

    let list_id: i64 = sqlx::query_scalar("SELECT list_id FROM todos WHERE title = 'stray'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(list_id, inbox_id(&pool).await);
}

#[tokio::test]
async fn test_duplicate_positions_are_renumbered_newest_first() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();
    let inbox = inbox_id(&pool).await;

    for (title, created_at) in [
        ("oldest", "2024-01-01 09:00:00"),
        ("middle", "2024-01-02 09:00:00"),
        ("newest", "2024-01-03 09:00:00"),
    ] {
        sqlx::query("INSERT INTO todos (title, list_id, position, created_at) VALUES (?, ?, 0, ?)")
            .bind(title)
            .bind(inbox)
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
    }

    let report = ensure_schema(&pool).await.unwrap();
    assert_eq!(report.lists_renumbered, vec![inbox]);

    assert_eq!(
        positions_by_title(&pool, inbox).await,
        vec![
            ("newest".to_string(), 0),
            ("middle".to_string(), 1),
            ("oldest".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_equal_timestamps_break_ties_by_id_descending() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();
    let inbox = inbox_id(&pool).await;

    for title in ["first", "second", "third"] {
        sqlx::query(
            "INSERT INTO todos (title, list_id, position, created_at) VALUES (?, ?, 5, '2024-01-01 00:00:00')",
        )
        .bind(title)
        .bind(inbox)
        .execute(&pool)
        .await
        .unwrap();
    }

    ensure_schema(&pool).await.unwrap();

    assert_eq!(
        positions_by_title(&pool, inbox).await,
        vec![
            ("third".to_string(), 0),
            ("second".to_string(), 1),
            ("first".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_null_positions_from_nullable_legacy_column_are_repaired() {
    let pool = connect_in_memory().await.unwrap();
    sqlx::query(
        "CREATE TABLE lists (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, position INTEGER NOT NULL DEFAULT 0, color TEXT, created_at DATETIME)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TABLE todos (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, done INTEGER NOT NULL DEFAULT 0, created_at DATETIME, list_id INTEGER, position INTEGER)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO lists (id, name) VALUES (7, 'Work')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO todos (title, list_id, position, created_at) VALUES ('a', 7, 0, '2024-01-01 00:00:00'), ('b', 7, NULL, '2024-01-02 00:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    ensure_schema(&pool).await.unwrap();

    assert_eq!(
        positions_by_title(&pool, 7).await,
        vec![("b".to_string(), 0), ("a".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_dense_lists_are_left_alone() {
    let pool = connect_in_memory().await.unwrap();
    ensure_schema(&pool).await.unwrap();
    let inbox = inbox_id(&pool).await;

    // Manual order that disagrees with recency must survive
    for (title, position, created_at) in [
        ("newest", 2, "2024-01-03 00:00:00"),
        ("oldest", 0, "2024-01-01 00:00:00"),
        ("middle", 1, "2024-01-02 00:00:00"),
    ] {
        sqlx::query("INSERT INTO todos (title, list_id, position, created_at) VALUES (?, ?, ?, ?)")
            .bind(title)
            .bind(inbox)
            .bind(position)
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
    }

    let report = ensure_schema(&pool).await.unwrap();
    assert!(report.lists_renumbered.is_empty());
    assert_eq!(
        positions_by_title(&pool, inbox).await,
        vec![
            ("oldest".to_string(), 0),
            ("middle".to_string(), 1),
            ("newest".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_table_without_primary_key_is_fatal() {
    let pool = connect_in_memory().await.unwrap();
    sqlx::query("CREATE TABLE lists (name TEXT)")
        .execute(&pool)
        .await
        .unwrap();

    let err = ensure_schema(&pool).await.unwrap_err();
    assert!(matches!(err, StorageError::Schema(_)), "got {:?}", err);

    // Nothing from the failed pass was committed
    let ledger: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(ledger, 0);
}

#[tokio::test]
async fn test_concurrent_bootstrap_on_shared_file_seeds_once() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::new(dir.path().join("todo.db"));
    let pool = connect(&config).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { ensure_schema(&pool).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let inbox: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE name = 'Inbox'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let notepad: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE name = 'Notepad'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((inbox, notepad), (1, 1));
}
