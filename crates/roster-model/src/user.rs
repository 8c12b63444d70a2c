//! User domain model.
//!
//! Users are the primary identity entities in Roster. They authenticate
//! with a password (HTTP login or LDAP simple bind) and may belong to
//! any number of groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account status of a user.
///
/// A disabled user keeps their data but cannot authenticate through
/// either front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// The account may authenticate.
    Enabled,
    /// The account is blocked from authenticating.
    Disabled,
}

impl UserStatus {
    /// Returns the canonical string form (`"enabled"` / `"disabled"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "enabled" => Some(Self::Enabled),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// A directory user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, immutable for the lifetime of the account.
    pub id: Uuid,
    /// Unique login name, at most 64 characters.
    pub username: String,
    /// Human-readable name, at most 128 characters.
    pub display_name: String,
    /// Unique email address, at most 255 characters.
    pub email: String,
    /// Password hash in PHC string format. Never serialized outward.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Optional phone number, at most 32 characters.
    pub phone: Option<String>,
    /// Account status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new enabled user with a fresh id and current timestamps.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            display_name: display_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            phone: None,
            status: UserStatus::Enabled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Returns whether the account may authenticate.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.status, UserStatus::Enabled)
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Plaintext password; hashed before it reaches the store.
    pub password: String,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// Partial update for a user.
///
/// `None` means "leave unchanged"; the phone field distinguishes
/// absent from cleared with a nested `Option`.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name, if changing.
    pub display_name: Option<String>,
    /// New email, if changing.
    pub email: Option<String>,
    /// New phone: `Some(None)` clears it, `Some(Some(v))` sets it.
    pub phone: Option<Option<String>>,
}
