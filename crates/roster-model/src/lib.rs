//! # roster-model
//!
//! Domain models for the Roster directory service.
//!
//! These types are shared by the storage layer, the HTTP API and the
//! LDAP front-end. They carry no persistence or protocol concerns.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod group;
pub mod user;

pub use group::{CreateGroupInput, Group, UpdateGroupInput};
pub use user::{CreateUserInput, UpdateUserInput, User, UserStatus};

use serde::{Deserialize, Serialize};

/// A page of results from a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of items matching the query.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size used for the query.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Creates a new page.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
        }
    }
}
