//! # roster-auth
//!
//! Authentication for the Roster directory.
//!
//! Provides Argon2id password hashing, JWT issuance and validation for
//! the HTTP API, and the [`AuthService`] used by both HTTP login and
//! LDAP simple bind. Authentication failures are indistinguishable to
//! callers: unknown user, wrong password and disabled account all
//! surface as [`AuthError::InvalidCredentials`].

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use password::{PasswordHasherService, PasswordPolicy};
pub use service::AuthService;
pub use token::{Claims, TokenService};
