//! Authentication error types.

use roster_storage::StorageError;
use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication operation errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials.
    ///
    /// Deliberately generic: covers unknown user, wrong password and
    /// disabled account so callers cannot enumerate usernames.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token is missing, malformed, expired or has a bad signature.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Storage layer failure while looking up the user.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
