//! Group domain model.
//!
//! Groups organize users and may form a forest through an optional
//! parent reference. Membership is a flat many-to-many relation; the
//! LDAP front-end projects it as `member` DNs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::User;

/// A directory group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: Uuid,
    /// Group name, at most 64 characters.
    pub name: String,
    /// Description, at most 255 characters. Empty when unset.
    pub description: String,
    /// Parent group id. `None` for top-level groups. A group must not
    /// be its own parent; longer cycles are not detected.
    pub parent_id: Option<Uuid>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
    /// Member users, eagerly loaded where the query site specifies it.
    #[serde(default)]
    pub members: Vec<User>,
}

impl Group {
    /// Creates a new top-level group with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: description.into(),
            parent_id: None,
            created_at: now,
            updated_at: now,
            members: Vec::new(),
        }
    }

    /// Sets the parent group.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Input for creating a new group.
#[derive(Debug, Clone)]
pub struct CreateGroupInput {
    /// Group name.
    pub name: String,
    /// Description, may be empty.
    pub description: String,
    /// Optional parent group.
    pub parent_id: Option<Uuid>,
}

/// Partial update for a group. `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupInput {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New parent: `Some(None)` detaches, `Some(Some(id))` re-parents.
    pub parent_id: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_has_no_parent() {
        let group = Group::new("developers", "Development team");
        assert!(group.parent_id.is_none());
        assert!(group.members.is_empty());
    }

    #[test]
    fn with_parent_sets_parent() {
        let parent = Group::new("eng", "");
        let child = Group::new("backend", "").with_parent(parent.id);
        assert_eq!(child.parent_id, Some(parent.id));
    }
}
