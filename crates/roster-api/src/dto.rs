//! Request and response DTOs.
//!
//! Requests validate the data-model field limits at the boundary;
//! responses never expose the password hash.

use chrono::{DateTime, Utc};
use roster_model::{Group, User, UserStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ============================================================================
// Users
// ============================================================================

/// A user as exposed by the API.
#[derive(Debug, Serialize)]
pub struct UserDto {
    /// Unique identifier.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Phone number, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account status.
    pub status: UserStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            phone: user.phone,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Login name, unique, at most 64 characters.
    pub username: String,
    /// Display name, at most 128 characters.
    pub display_name: String,
    /// Email, unique, at most 255 characters.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
    /// Optional phone number, at most 32 characters.
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateUserRequest {
    /// Validates field presence and limits.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ApiError> {
        require_len("username", &self.username, 64)?;
        require_len("display_name", &self.display_name, 128)?;
        require_len("email", &self.email, 255)?;
        if !self.email.contains('@') {
            return Err(ApiError::Validation("email is not valid".to_string()));
        }
        if self.password.len() < 6 {
            return Err(ApiError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        if let Some(phone) = &self.phone {
            limit_len("phone", phone, 32)?;
        }
        Ok(())
    }
}

/// Request body for `PUT /users/{id}`. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name.
    pub display_name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New phone number; an explicit empty string clears it.
    pub phone: Option<String>,
}

impl UpdateUserRequest {
    /// Validates the present fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(display_name) = &self.display_name {
            require_len("display_name", display_name, 128)?;
        }
        if let Some(email) = &self.email {
            require_len("email", email, 255)?;
            if !email.contains('@') {
                return Err(ApiError::Validation("email is not valid".to_string()));
            }
        }
        if let Some(phone) = &self.phone {
            limit_len("phone", phone, 32)?;
        }
        Ok(())
    }
}

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size, clamped to 1..=100.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Optional substring match on username and display name.
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl ListUsersQuery {
    /// Normalizes page and page size into their valid ranges.
    #[must_use]
    pub fn normalized(&self) -> (u32, u32) {
        let page = self.page.max(1);
        let page_size = self.page_size.clamp(1, 100);
        (page, page_size)
    }
}

/// Request body for `PUT /users/{id}/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// The current password.
    pub old_password: String,
    /// The replacement password.
    pub new_password: String,
}

/// Request body for `PUT /users/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// The new status.
    pub status: UserStatus,
}

// ============================================================================
// Auth
// ============================================================================

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Response payload for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated user.
    pub user: UserDto,
}

// ============================================================================
// Groups
// ============================================================================

/// A group as exposed by the API.
#[derive(Debug, Serialize)]
pub struct GroupDto {
    /// Unique identifier.
    pub id: Uuid,
    /// Group name.
    pub name: String,
    /// Description, empty when unset.
    pub description: String,
    /// Parent group, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Members, present only where the endpoint loads them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserDto>>,
}

impl GroupDto {
    /// Converts a group without exposing members.
    #[must_use]
    pub fn without_members(group: Group) -> Self {
        Self::convert(group, false)
    }

    /// Converts a group including its loaded members.
    #[must_use]
    pub fn with_members(group: Group) -> Self {
        Self::convert(group, true)
    }

    fn convert(group: Group, include_members: bool) -> Self {
        let members = include_members
            .then(|| group.members.into_iter().map(UserDto::from).collect());
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            parent_id: group.parent_id,
            created_at: group.created_at,
            updated_at: group.updated_at,
            members,
        }
    }
}

/// Request body for `POST /groups`.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name, at most 64 characters.
    pub name: String,
    /// Description, at most 255 characters.
    #[serde(default)]
    pub description: String,
    /// Optional parent group id.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl CreateGroupRequest {
    /// Validates field presence and limits.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ApiError> {
        require_len("name", &self.name, 64)?;
        limit_len("description", &self.description, 255)
    }
}

/// Request body for `PUT /groups/{id}`. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New parent id; explicit null detaches the group.
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

impl UpdateGroupRequest {
    /// Validates the present fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            require_len("name", name, 64)?;
        }
        if let Some(description) = &self.description {
            limit_len("description", description, 255)?;
        }
        Ok(())
    }
}

/// Request body for `POST /groups/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct AddMembersRequest {
    /// Users to add.
    pub user_ids: Vec<Uuid>,
}

/// Request body for `PUT /ldap/config`.
#[derive(Debug, Deserialize)]
pub struct UpdateLdapConfigRequest {
    /// Directory namespace root.
    pub base_dn: String,
    /// Schema dialect token: `openldap` or `activedirectory`.
    pub mode: String,
    /// Listener port (takes effect on restart).
    pub port: u16,
}

/// Distinguishes "field absent" from "field set to null" in JSON.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

fn require_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    limit_len(field, value, max)
}

fn limit_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
