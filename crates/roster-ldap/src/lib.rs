//! # roster-ldap
//!
//! LDAP v3 front-end for the Roster directory.
//!
//! The directory is emulated in one of two schema dialects: OpenLDAP
//! (`inetOrgPerson` / `groupOfNames`) or Active Directory (`user` /
//! `group`). This crate contains the pure core — DN codec, attribute
//! mapper, filter AST with its two interpreters — plus the bind and
//! search handlers and the TCP listener that frames them with
//! [`ldap3_proto`]'s codec.
//!
//! The front-end is read-plus-bind: all writes go through the HTTP API.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod attrs;
pub mod config;
pub mod dn;
pub mod entry;
pub mod filter;
pub mod handler;
pub mod mode;
pub mod server;

pub use config::LdapSettings;
pub use entry::LdapEntry;
pub use handler::{LdapHandler, LdapResponse};
pub use mode::LdapMode;
pub use server::create_ldap_server;
