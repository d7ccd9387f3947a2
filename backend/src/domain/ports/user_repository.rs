//! Port for account persistence.

use async_trait::async_trait;

use crate::domain::{NewUser, UserAccount, UserChanges, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Another account already uses the username.
        DuplicateUsername { username } => "username already taken: {username}",
        /// The backing store could not be written.
        Storage { message } => "user store write failed: {message}",
    }
}

/// Account storage.
///
/// Identifier assignment and the username uniqueness check happen inside the
/// adapter's write lock so concurrent inserts cannot collide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All accounts in id order.
    async fn list(&self) -> Result<Vec<UserAccount>, UserRepositoryError>;

    /// Account with the given id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Account with the given username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Append a new account with the next free id.
    async fn insert(&self, user: NewUser) -> Result<UserAccount, UserRepositoryError>;

    /// Apply `changes`; `None` when the account does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Remove an account; `false` when it did not exist.
    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError>;
}
