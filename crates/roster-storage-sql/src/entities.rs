//! Row types mapped from query results.
//!
//! The `Any` driver only decodes primitive types, so rows carry TEXT
//! ids and RFC 3339 timestamps; `convert` turns them into domain
//! models.

use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    /// UUID as TEXT.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// PHC password hash.
    pub password_hash: String,
    /// Phone number, NULL when unset.
    pub phone: Option<String>,
    /// Account status ("enabled" / "disabled").
    pub status: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 update timestamp.
    pub updated_at: String,
}

/// A row from the `groups` table.
#[derive(Debug, FromRow)]
pub struct GroupRow {
    /// UUID as TEXT.
    pub id: String,
    /// Group name.
    pub name: String,
    /// Description, empty when unset.
    pub description: String,
    /// Parent group UUID as TEXT, NULL for top-level groups.
    pub parent_id: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 update timestamp.
    pub updated_at: String,
}

/// A membership join row: a user row tagged with its group id.
#[derive(Debug, FromRow)]
pub struct MemberRow {
    /// Group UUID as TEXT.
    pub group_id: String,
    /// User UUID as TEXT.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// PHC password hash.
    pub password_hash: String,
    /// Phone number, NULL when unset.
    pub phone: Option<String>,
    /// Account status.
    pub status: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 update timestamp.
    pub updated_at: String,
}
