//! # roster-storage-sql
//!
//! SQLx-based storage implementation for the Roster directory.
//!
//! Uses the `Any` driver so the backing store is selected at runtime by
//! the connection URL: a SQLite file (`sqlite://data/roster.db`) or a
//! `PostgreSQL` DSN (`postgres://...`). UUIDs and timestamps are stored
//! as TEXT for portability across both backends; queries use `$n`
//! placeholders, which both accept.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod convert;
pub mod entities;
pub mod error;
pub mod group;
pub mod migrate;
pub mod pool;
pub mod render;
pub mod user;

pub use group::SqlGroupStore;
pub use migrate::run_migrations;
pub use pool::{create_pool, PoolConfig};
pub use user::SqlUserStore;
