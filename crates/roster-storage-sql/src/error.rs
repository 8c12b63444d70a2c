//! SQL storage error mapping.

use roster_storage::StorageError;
use sqlx::Error as SqlxError;

/// Converts a `SQLx` error into a storage error.
///
/// Unique and foreign key violations are recognized for both backends:
/// `PostgreSQL` reports SQLSTATE codes (23505 / 23503), SQLite reports
/// extended result codes (2067, 1555 / 787).
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            let message = db_err.message().to_string();
            if is_unique_violation(&code, &message) {
                // Callers attach the entity and field context.
                StorageError::Duplicate {
                    entity_type: "Entity",
                    field: "unique",
                    value: message,
                }
            } else if is_foreign_key_violation(&code, &message) {
                StorageError::InvalidReference(message)
            } else {
                StorageError::Query(message)
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("connection pool closed".to_string()),
        e => StorageError::Query(e.to_string()),
    }
}

/// Converts a `SQLx` error, attributing unique violations to an entity
/// and field.
pub fn from_sqlx_error_for(
    err: SqlxError,
    entity_type: &'static str,
    field: &'static str,
    value: &str,
) -> StorageError {
    match from_sqlx_error(err) {
        StorageError::Duplicate { .. } => StorageError::Duplicate {
            entity_type,
            field,
            value: value.to_string(),
        },
        other => other,
    }
}

fn is_unique_violation(code: &str, message: &str) -> bool {
    code == "23505" || code == "2067" || code == "1555" || message.contains("UNIQUE constraint")
}

fn is_foreign_key_violation(code: &str, message: &str) -> bool {
    code == "23503" || code == "787" || message.contains("FOREIGN KEY constraint")
}
