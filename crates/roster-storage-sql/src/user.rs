//! SQL implementation of the user storage provider.

use async_trait::async_trait;
use chrono::Utc;
use roster_model::{Group, Page, User, UserStatus};
use roster_storage::{Predicate, StorageError, StorageResult, UserStore};
use sqlx::AnyPool;
use uuid::Uuid;

use crate::convert::{group_from_row, user_from_row};
use crate::entities::{GroupRow, UserRow};
use crate::error::{from_sqlx_error, from_sqlx_error_for};
use crate::render::render;

const USER_COLUMNS: &str =
    "id, username, display_name, email, password_hash, phone, status, created_at, updated_at";

/// SQL user storage provider.
#[derive(Clone)]
pub struct SqlUserStore {
    pool: AnyPool,
}

impl SqlUserStore {
    /// Creates a new SQL user provider.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn create_user(&self, user: &User) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO users (
                id, username, display_name, email, password_hash,
                phone, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.phone.as_deref())
        .bind(user.status.as_str())
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e, user))?;

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;

        row.map(user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;

        row.map(user_from_row).transpose()
    }

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> StorageResult<Page<User>> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar(
                    r"SELECT COUNT(*) FROM users
                      WHERE username LIKE $1 ESCAPE '\' OR display_name LIKE $1 ESCAPE '\'",
                )
                .bind(p)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(from_sqlx_error)?;

        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows: Vec<UserRow> = match &pattern {
            Some(p) => {
                sqlx::query_as(&format!(
                    r"SELECT {USER_COLUMNS} FROM users
                      WHERE username LIKE $1 ESCAPE '\' OR display_name LIKE $1 ESCAPE '\'
                      ORDER BY created_at, id LIMIT $2 OFFSET $3"
                ))
                .bind(p)
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
                ))
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(from_sqlx_error)?;

        let items = rows
            .into_iter()
            .map(user_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        let total = u64::try_from(total).unwrap_or(0);
        Ok(Page::new(items, total, page, page_size))
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let result = sqlx::query(
            r"UPDATE users SET
                display_name = $2, email = $3, phone = $4, status = $5, updated_at = $6
            WHERE id = $1",
        )
        .bind(user.id.to_string())
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(user.phone.as_deref())
        .bind(user.status.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_field(e, user))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", user.id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<()> {
        // Membership cleanup is explicit: SQLite does not enforce
        // cascades unless foreign keys are enabled per connection.
        sqlx::query("DELETE FROM group_members WHERE user_id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", id));
        }
        Ok(())
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id.to_string())
            .bind(password_hash)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", id));
        }
        Ok(())
    }

    async fn update_user_status(&self, id: Uuid, status: UserStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.to_string())
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", id));
        }
        Ok(())
    }

    async fn user_groups(&self, user_id: Uuid) -> StorageResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(
            r"SELECT g.id, g.name, g.description, g.parent_id, g.created_at, g.updated_at
              FROM groups g
              JOIN group_members gm ON gm.group_id = g.id
              WHERE gm.user_id = $1
              ORDER BY g.created_at, g.id",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn all_users(&self) -> StorageResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        rows.into_iter().map(user_from_row).collect()
    }

    async fn find_users(&self, predicate: &Predicate) -> StorageResult<Vec<User>> {
        let rendered = render(predicate);
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} ORDER BY created_at, id",
            rendered.sql
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for arg in &rendered.args {
            query = query.bind(arg);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        rows.into_iter().map(user_from_row).collect()
    }
}

/// Attributes a unique violation to the username or email field by
/// inspecting the backend message.
fn duplicate_field(err: sqlx::Error, user: &User) -> StorageError {
    let message = match &err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        _ => String::new(),
    };
    if message.contains("email") {
        from_sqlx_error_for(err, "User", "email", &user.email)
    } else {
        from_sqlx_error_for(err, "User", "username", &user.username)
    }
}

/// Escapes `LIKE` wildcards in a user-supplied search string.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
