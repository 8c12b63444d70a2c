//! # roster-api
//!
//! JSON/HTTP management API for the Roster directory.
//!
//! All endpoints live under `/api/v1` and answer with the envelope
//! `{code, message, data}` where code 0 means success. `POST
//! /auth/login` and `POST /users` are public; every other route
//! requires a Bearer token issued by login. The LDAP front-end shares
//! the same stores and authentication service.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod auth;
pub mod dto;
pub mod error;
pub mod response;
pub mod router;
pub mod state;
pub mod trace;

pub use error::{ApiError, ApiResult};
pub use router::create_router;
pub use state::AppState;
