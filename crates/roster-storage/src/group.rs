//! Group storage provider trait.

use async_trait::async_trait;
use roster_model::{Group, User};
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for group storage operations.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Creates a new group.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidReference` if `parent_id` does not
    /// reference an existing group.
    async fn create_group(&self, group: &Group) -> StorageResult<()>;

    /// Gets a group by id with members eagerly loaded.
    async fn get_group(&self, id: Uuid) -> StorageResult<Option<Group>>;

    /// Returns all groups without members.
    async fn list_groups(&self) -> StorageResult<Vec<Group>>;

    /// Updates a group's name, description, parent and `updated_at`.
    async fn update_group(&self, group: &Group) -> StorageResult<()>;

    /// Deletes a group and its membership rows.
    async fn delete_group(&self, id: Uuid) -> StorageResult<()>;

    /// Adds users to a group. Existing memberships are left intact.
    async fn add_members(&self, group_id: Uuid, user_ids: &[Uuid]) -> StorageResult<()>;

    /// Removes a user from a group.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StorageResult<()>;

    /// Returns the members of a group.
    async fn group_members(&self, group_id: Uuid) -> StorageResult<Vec<User>>;

    /// Returns all groups with members eagerly loaded, in the store's
    /// natural order.
    async fn all_groups(&self) -> StorageResult<Vec<Group>>;
}
