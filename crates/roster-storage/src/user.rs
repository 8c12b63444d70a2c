//! User storage provider trait.

use async_trait::async_trait;
use roster_model::{Group, Page, User, UserStatus};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::predicate::Predicate;

/// Provider for user storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if the username or email is
    /// already taken.
    async fn create_user(&self, user: &User) -> StorageResult<()>;

    /// Gets a user by id.
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    /// Returns a page of users, optionally filtered by a search string
    /// matched against username and display name.
    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> StorageResult<Page<User>>;

    /// Updates a user's mutable profile fields and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn update_user(&self, user: &User) -> StorageResult<()>;

    /// Deletes a user and their group memberships.
    async fn delete_user(&self, id: Uuid) -> StorageResult<()>;

    /// Replaces the stored password hash.
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StorageResult<()>;

    /// Sets the account status.
    async fn update_user_status(&self, id: Uuid, status: UserStatus) -> StorageResult<()>;

    /// Returns the groups the user is a member of.
    async fn user_groups(&self, user_id: Uuid) -> StorageResult<Vec<Group>>;

    /// Returns all users in the store's natural order.
    async fn all_users(&self) -> StorageResult<Vec<User>>;

    /// Returns users matching a relational predicate over the user
    /// table's columns, in the store's natural order.
    async fn find_users(&self, predicate: &Predicate) -> StorageResult<Vec<User>>;
}
