//! The authentication service shared by HTTP login and LDAP bind.

use std::sync::Arc;

use roster_model::User;
use roster_storage::UserStore;

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordHasherService;
use crate::token::{Claims, TokenService};

/// Verifies credentials against the user store and manages API tokens.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasherService,
    tokens: TokenService,
}

impl AuthService {
    /// Creates a new authentication service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasherService,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Verifies a username/password pair.
    ///
    /// Used by both HTTP login and LDAP simple bind. A disabled account
    /// fails even with the correct password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for unknown user,
    /// wrong password or disabled account, without distinguishing
    /// which; storage failures propagate as [`AuthError::Storage`].
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_enabled() {
            tracing::debug!(username, "authentication rejected: account disabled");
            return Err(AuthError::InvalidCredentials);
        }

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::debug!(username, "authentication rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Authenticates and issues an API token.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::authenticate`].
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<(String, User)> {
        let user = self.authenticate(username, password).await?;
        let token = self.tokens.issue(&user)?;
        Ok((token, user))
    }

    /// Validates an API token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for invalid tokens.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        self.tokens.validate(token)
    }

    /// Hashes a plaintext password for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.hasher.hash(password)
    }

    /// Verifies a plaintext password against a stored hash.
    #[must_use]
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.hasher.verify(password, stored_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PasswordPolicy;
    use async_trait::async_trait;
    use roster_model::{Group, Page, UserStatus};
    use roster_storage::{Predicate, StorageResult};
    use uuid::Uuid;

    struct FixedUsers {
        users: Vec<User>,
    }

    #[async_trait]
    impl UserStore for FixedUsers {
        async fn create_user(&self, _user: &User) -> StorageResult<()> {
            Ok(())
        }
        async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }
        async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
            Ok(self.users.iter().find(|u| u.username == username).cloned())
        }
        async fn list_users(
            &self,
            page: u32,
            page_size: u32,
            _search: Option<&str>,
        ) -> StorageResult<Page<User>> {
            Ok(Page::new(self.users.clone(), self.users.len() as u64, page, page_size))
        }
        async fn update_user(&self, _user: &User) -> StorageResult<()> {
            Ok(())
        }
        async fn delete_user(&self, _id: Uuid) -> StorageResult<()> {
            Ok(())
        }
        async fn update_user_password(&self, _id: Uuid, _hash: &str) -> StorageResult<()> {
            Ok(())
        }
        async fn update_user_status(&self, _id: Uuid, _status: UserStatus) -> StorageResult<()> {
            Ok(())
        }
        async fn user_groups(&self, _user_id: Uuid) -> StorageResult<Vec<Group>> {
            Ok(Vec::new())
        }
        async fn all_users(&self) -> StorageResult<Vec<User>> {
            Ok(self.users.clone())
        }
        async fn find_users(&self, _predicate: &Predicate) -> StorageResult<Vec<User>> {
            Ok(self.users.clone())
        }
    }

    fn service_with(users: Vec<User>) -> AuthService {
        let hasher = PasswordHasherService::new(PasswordPolicy {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
            hash_length: 32,
        });
        AuthService::new(
            Arc::new(FixedUsers { users }),
            hasher,
            TokenService::new("test-secret", 24),
        )
    }

    fn alice(hasher: &PasswordHasherService, status: UserStatus) -> User {
        let mut user = User::new(
            "alice",
            "Alice Q",
            "alice@example.com",
            hasher.hash("secret").unwrap(),
        );
        user.status = status;
        user
    }

    fn test_hasher() -> PasswordHasherService {
        PasswordHasherService::new(PasswordPolicy {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
            hash_length: 32,
        })
    }

    #[tokio::test]
    async fn authenticate_success() {
        let hasher = test_hasher();
        let service = service_with(vec![alice(&hasher, UserStatus::Enabled)]);

        let user = service.authenticate("alice", "secret").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_fails() {
        let hasher = test_hasher();
        let service = service_with(vec![alice(&hasher, UserStatus::Enabled)]);

        let err = service.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_user_fails_with_correct_password() {
        let hasher = test_hasher();
        let service = service_with(vec![alice(&hasher, UserStatus::Disabled)]);

        let err = service.authenticate("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_fails() {
        let service = service_with(Vec::new());

        let err = service.authenticate("nobody", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn failure_modes_are_indistinguishable() {
        let hasher = test_hasher();
        let service = service_with(vec![alice(&hasher, UserStatus::Disabled)]);

        let wrong_pw = service.authenticate("alice", "wrong").await.unwrap_err();
        let unknown = service.authenticate("nobody", "secret").await.unwrap_err();
        let disabled = service.authenticate("alice", "secret").await.unwrap_err();

        assert_eq!(wrong_pw.to_string(), unknown.to_string());
        assert_eq!(unknown.to_string(), disabled.to_string());
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let hasher = test_hasher();
        let service = service_with(vec![alice(&hasher, UserStatus::Enabled)]);

        let (token, user) = service.login("alice", "secret").await.unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
    }
}
