//! Conversions between row types and domain models.

use chrono::{DateTime, Utc};
use roster_model::{Group, User, UserStatus};
use roster_storage::{StorageError, StorageResult};
use uuid::Uuid;

use crate::entities::{GroupRow, MemberRow, UserRow};

/// Parses a TEXT UUID column.
pub fn parse_uuid(value: &str, column: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| StorageError::Corrupt(format!("invalid uuid in {column}: {e}")))
}

/// Parses an RFC 3339 TEXT timestamp column.
pub fn parse_timestamp(value: &str, column: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp in {column}: {e}")))
}

fn parse_status(value: &str) -> StorageResult<UserStatus> {
    UserStatus::from_str_opt(value)
        .ok_or_else(|| StorageError::Corrupt(format!("invalid user status '{value}'")))
}

/// Converts a user row into a domain user.
pub fn user_from_row(row: UserRow) -> StorageResult<User> {
    Ok(User {
        id: parse_uuid(&row.id, "users.id")?,
        username: row.username,
        display_name: row.display_name,
        email: row.email,
        password_hash: row.password_hash,
        phone: row.phone,
        status: parse_status(&row.status)?,
        created_at: parse_timestamp(&row.created_at, "users.created_at")?,
        updated_at: parse_timestamp(&row.updated_at, "users.updated_at")?,
    })
}

/// Converts a membership join row into `(group id, user)`.
pub fn member_from_row(row: MemberRow) -> StorageResult<(Uuid, User)> {
    let group_id = parse_uuid(&row.group_id, "group_members.group_id")?;
    let user = user_from_row(UserRow {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        email: row.email,
        password_hash: row.password_hash,
        phone: row.phone,
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })?;
    Ok((group_id, user))
}

/// Converts a group row into a domain group without members.
pub fn group_from_row(row: GroupRow) -> StorageResult<Group> {
    let parent_id = match row.parent_id {
        Some(ref p) => Some(parse_uuid(p, "groups.parent_id")?),
        None => None,
    };
    Ok(Group {
        id: parse_uuid(&row.id, "groups.id")?,
        name: row.name,
        description: row.description,
        parent_id,
        created_at: parse_timestamp(&row.created_at, "groups.created_at")?,
        updated_at: parse_timestamp(&row.updated_at, "groups.updated_at")?,
        members: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user_row() -> UserRow {
        UserRow {
            id: "0191e4a0-0000-7000-8000-000000000001".to_string(),
            username: "jdoe".to_string(),
            display_name: "John Doe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            phone: None,
            status: "enabled".to_string(),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn user_row_converts() {
        let user = user_from_row(sample_user_row()).unwrap();
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.status, UserStatus::Enabled);
        assert!(user.phone.is_none());
    }

    #[test]
    fn bad_uuid_is_corrupt() {
        let mut row = sample_user_row();
        row.id = "not-a-uuid".to_string();
        let err = user_from_row(row).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[test]
    fn bad_status_is_corrupt() {
        let mut row = sample_user_row();
        row.status = "frozen".to_string();
        let err = user_from_row(row).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
