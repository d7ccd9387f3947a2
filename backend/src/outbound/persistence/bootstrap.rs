//! First-run seeding of the administrator account.

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ports::{PasswordHasher, PasswordHasherError, UserRepository, UserRepositoryError};
use crate::domain::{DisplayName, NewUser, Role, UserId, Username};

use super::JsonUserRepository;

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";
/// Display name of the seeded administrator.
pub const ADMIN_DISPLAY_NAME: &str = "System administrator";
/// Password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Failure seeding the administrator.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The password could not be hashed.
    #[error(transparent)]
    Hash(#[from] PasswordHasherError),
    /// The account could not be stored.
    #[error(transparent)]
    Store(#[from] UserRepositoryError),
}

/// Seed the administrator when `users.json` does not exist yet.
///
/// Returns the new account id, or `None` when accounts already exist.
///
/// # Errors
///
/// Returns [`BootstrapError`] when hashing or storing the account fails.
pub async fn ensure_admin(
    users: &JsonUserRepository,
    hasher: &dyn PasswordHasher,
    password: Option<&str>,
) -> Result<Option<UserId>, BootstrapError> {
    if users.is_initialised() {
        return Ok(None);
    }
    let password = match password.filter(|value| !value.is_empty()) {
        Some(value) => value,
        None => {
            warn!("MEDREP_ADMIN_PASSWORD not set; seeding admin with the default password");
            DEFAULT_ADMIN_PASSWORD
        }
    };
    let (name, username) = match (
        DisplayName::parse(Some(ADMIN_DISPLAY_NAME)),
        Username::parse(Some(ADMIN_USERNAME)),
    ) {
        (Ok(name), Ok(username)) => (name, username),
        (Err(err), _) | (_, Err(err)) => {
            return Err(UserRepositoryError::storage(err.message()).into());
        }
    };
    let account = users
        .insert(NewUser {
            name,
            username,
            role: Role::Admin,
            verifier: hasher.hash(password)?,
        })
        .await?;
    info!(user_id = %account.user.id, "seeded administrator account");
    Ok(Some(account.user.id))
}
