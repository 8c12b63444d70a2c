//! Schema migration.
//!
//! The schema is small enough to manage with idempotent DDL executed at
//! startup. Statements are kept portable across SQLite and `PostgreSQL`.

use roster_storage::{StorageError, StorageResult};
use sqlx::AnyPool;

const STATEMENTS: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        display_name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        phone TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
    r"CREATE TABLE IF NOT EXISTS groups (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        parent_id TEXT REFERENCES groups (id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS group_members (
        group_id TEXT NOT NULL REFERENCES groups (id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        PRIMARY KEY (group_id, user_id)
    )",
];

/// Creates the schema if it does not exist yet.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub async fn run_migrations(pool: &AnyPool) -> StorageResult<()> {
    for stmt in STATEMENTS {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Query(format!("migration failed: {e}")))?;
    }
    tracing::debug!("schema migration complete");
    Ok(())
}
