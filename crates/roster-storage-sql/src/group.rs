//! SQL implementation of the group storage provider.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use roster_model::{Group, User};
use roster_storage::{GroupStore, StorageError, StorageResult};
use sqlx::AnyPool;
use uuid::Uuid;

use crate::convert::{group_from_row, member_from_row, user_from_row};
use crate::entities::{GroupRow, MemberRow, UserRow};
use crate::error::{from_sqlx_error, from_sqlx_error_for};

const GROUP_COLUMNS: &str = "id, name, description, parent_id, created_at, updated_at";

/// SQL group storage provider.
#[derive(Clone)]
pub struct SqlGroupStore {
    pool: AnyPool,
}

impl SqlGroupStore {
    /// Creates a new SQL group provider.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    async fn members_of(&self, group_id: Uuid) -> StorageResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r"SELECT u.id, u.username, u.display_name, u.email, u.password_hash,
                     u.phone, u.status, u.created_at, u.updated_at
              FROM users u
              JOIN group_members gm ON gm.user_id = u.id
              WHERE gm.group_id = $1
              ORDER BY u.created_at, u.id",
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        rows.into_iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl GroupStore for SqlGroupStore {
    async fn create_group(&self, group: &Group) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO groups (id, name, description, parent_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(group.id.to_string())
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.parent_id.map(|p| p.to_string()))
        .bind(group.created_at.to_rfc3339())
        .bind(group.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| from_sqlx_error_for(e, "Group", "name", &group.name))?;

        Ok(())
    }

    async fn get_group(&self, id: Uuid) -> StorageResult<Option<Group>> {
        let row: Option<GroupRow> =
            sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(from_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut group = group_from_row(row)?;
        group.members = self.members_of(id).await?;
        Ok(Some(group))
    }

    async fn list_groups(&self) -> StorageResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn update_group(&self, group: &Group) -> StorageResult<()> {
        let result = sqlx::query(
            r"UPDATE groups SET name = $2, description = $3, parent_id = $4, updated_at = $5
            WHERE id = $1",
        )
        .bind(group.id.to_string())
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.parent_id.map(|p| p.to_string()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Group", group.id));
        }
        Ok(())
    }

    async fn delete_group(&self, id: Uuid) -> StorageResult<()> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        // Children of a deleted group become top-level.
        sqlx::query("UPDATE groups SET parent_id = NULL WHERE parent_id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Group", id));
        }
        Ok(())
    }

    async fn add_members(&self, group_id: Uuid, user_ids: &[Uuid]) -> StorageResult<()> {
        for user_id in user_ids {
            sqlx::query(
                r"INSERT INTO group_members (group_id, user_id)
                VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(group_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }

    async fn group_members(&self, group_id: Uuid) -> StorageResult<Vec<User>> {
        self.members_of(group_id).await
    }

    async fn all_groups(&self) -> StorageResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        let mut groups = rows
            .into_iter()
            .map(group_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        let member_rows: Vec<MemberRow> = sqlx::query_as(
            r"SELECT gm.group_id, u.id, u.username, u.display_name, u.email,
                     u.password_hash, u.phone, u.status, u.created_at, u.updated_at
              FROM group_members gm
              JOIN users u ON u.id = gm.user_id
              ORDER BY u.created_at, u.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        let mut by_group: HashMap<Uuid, Vec<User>> = HashMap::new();
        for row in member_rows {
            let (group_id, user) = member_from_row(row)?;
            by_group.entry(group_id).or_default().push(user);
        }

        for group in &mut groups {
            if let Some(members) = by_group.remove(&group.id) {
                group.members = members;
            }
        }

        Ok(groups)
    }
}
