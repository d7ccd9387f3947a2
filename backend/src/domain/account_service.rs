//! Account lifecycle: login, self-registration and admin user management.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::auth::password_text;
use super::ports::{PasswordCheck, PasswordHasher, UserRepository, UserRepositoryError};
use super::validation::FieldError;
use super::{
    DisplayName, Error, LoginCredentials, NewUser, Role, SessionClaims, User, UserChanges, UserId,
    Username,
};

/// Validated fields for a new account.
#[derive(Debug, Clone)]
pub struct Registration {
    name: DisplayName,
    username: Username,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw registration fields.
    pub fn try_from_parts(
        name: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            name: DisplayName::parse(name)?,
            username: Username::parse(username)?,
            password: password_text(password)?,
        })
    }
}

/// Raw admin edits; absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserEdit<'a> {
    /// Replacement display name.
    pub name: Option<&'a str>,
    /// Replacement role.
    pub role: Option<&'a str>,
    /// Replacement password.
    pub password: Option<&'a str>,
}

/// Authenticates users and manages accounts.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }

    /// Verify credentials and issue session claims.
    ///
    /// Legacy verifiers are upgraded after a successful check; a failed
    /// upgrade is logged and does not fail the login.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionClaims, Error> {
        let username = Username::parse(Some(credentials.username()))?;
        let account = self
            .users
            .find_by_username(&username)
            .await
            .map_err(Error::storage)?
            .ok_or_else(invalid_credentials)?;

        match self.hasher.verify(credentials.password(), &account.verifier) {
            PasswordCheck::Invalid => return Err(invalid_credentials()),
            PasswordCheck::Valid { needs_rehash: true } => {
                self.upgrade_verifier(account.user.id, credentials.password())
                    .await;
            }
            PasswordCheck::Valid { needs_rehash: false } => {}
        }

        info!(user_id = %account.user.id, role = %account.user.role, "login succeeded");
        Ok(SessionClaims::issue(&account.user, self.clock.utc()))
    }

    /// Create a rep or advisor account and sign it in.
    pub async fn register(
        &self,
        registration: Registration,
        requested_role: Option<&str>,
    ) -> Result<SessionClaims, Error> {
        let user = self
            .insert(registration, Role::for_registration(requested_role))
            .await?;
        Ok(SessionClaims::issue(&user, self.clock.utc()))
    }

    /// Create an account of any role on behalf of an administrator.
    pub async fn create_user(
        &self,
        caller: &SessionClaims,
        registration: Registration,
        requested_role: Option<&str>,
    ) -> Result<User, Error> {
        caller.require_role(Role::Admin)?;
        let role = Role::for_admin_assignment(requested_role)?;
        self.insert(registration, role).await
    }

    /// Profile of the signed-in user; `401` once the account is gone.
    pub async fn current_user(&self, caller: &SessionClaims) -> Result<User, Error> {
        self.users
            .find_by_id(caller.user_id)
            .await
            .map_err(Error::storage)?
            .map(|account| account.user)
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Claims for the account behind `claims` as it is stored now.
    ///
    /// Role and names are re-read so edits apply to live sessions; the
    /// original issue time is kept. `None` once the account is deleted.
    pub async fn revalidate(&self, claims: &SessionClaims) -> Result<Option<SessionClaims>, Error> {
        let account = self
            .users
            .find_by_id(claims.user_id)
            .await
            .map_err(Error::storage)?;
        Ok(account.map(|account| SessionClaims::issue(&account.user, claims.issued_at)))
    }

    /// Every account, without verifiers.
    pub async fn list_users(&self, caller: &SessionClaims) -> Result<Vec<User>, Error> {
        caller.require_role(Role::Admin)?;
        let accounts = self.users.list().await.map_err(Error::storage)?;
        Ok(accounts.into_iter().map(|account| account.user).collect())
    }

    /// Apply admin edits to an account.
    pub async fn update_user(
        &self,
        caller: &SessionClaims,
        id: UserId,
        edit: UserEdit<'_>,
    ) -> Result<User, Error> {
        caller.require_role(Role::Admin)?;
        let role = edit.role.map(str::parse::<Role>).transpose()?;
        if let Some(role) = role {
            self.ensure_role_change_allowed(id, role).await?;
        }
        let changes = UserChanges {
            name: edit.name.map(|raw| DisplayName::parse(Some(raw))).transpose()?,
            role,
            verifier: match edit.password {
                Some(raw) => Some(self.hash(&password_text(Some(raw))?)?),
                None => None,
            },
        };
        let updated = self
            .users
            .update(id, changes)
            .await
            .map_err(Error::storage)?
            .ok_or_else(|| user_not_found(id))?;
        info!(user_id = %id, "user updated");
        Ok(updated.user)
    }

    /// Delete a non-admin account.
    pub async fn delete_user(&self, caller: &SessionClaims, id: UserId) -> Result<(), Error> {
        caller.require_role(Role::Admin)?;
        let account = self
            .users
            .find_by_id(id)
            .await
            .map_err(Error::storage)?
            .ok_or_else(|| user_not_found(id))?;
        if account.user.role.is_admin() {
            return Err(Error::forbidden("admin accounts cannot be deleted"));
        }
        if !self.users.delete(id).await.map_err(Error::storage)? {
            return Err(user_not_found(id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Administrators keep their role, mirroring the deletion guard.
    async fn ensure_role_change_allowed(&self, id: UserId, role: Role) -> Result<(), Error> {
        let account = self
            .users
            .find_by_id(id)
            .await
            .map_err(Error::storage)?
            .ok_or_else(|| user_not_found(id))?;
        if account.user.role.is_admin() && !role.is_admin() {
            return Err(Error::forbidden("admin accounts cannot change role"));
        }
        Ok(())
    }

    async fn insert(&self, registration: Registration, role: Role) -> Result<User, Error> {
        let Registration {
            name,
            username,
            password,
        } = registration;
        let verifier = self.hash(&password)?;
        let account = self
            .users
            .insert(NewUser {
                name,
                username,
                role,
                verifier,
            })
            .await
            .map_err(|err| match err {
                UserRepositoryError::DuplicateUsername { .. } => {
                    Error::conflict("username already taken")
                }
                other => Error::storage(other),
            })?;
        info!(user_id = %account.user.id, role = %role, "user created");
        Ok(account.user)
    }

    async fn upgrade_verifier(&self, id: UserId, password: &str) {
        let verifier = match self.hasher.hash(password) {
            Ok(verifier) => verifier,
            Err(err) => {
                warn!(user_id = %id, error = %err, "could not rehash legacy password");
                return;
            }
        };
        let changes = UserChanges {
            verifier: Some(verifier),
            ..UserChanges::default()
        };
        match self.users.update(id, changes).await {
            Ok(_) => info!(user_id = %id, "upgraded legacy password verifier"),
            Err(err) => warn!(user_id = %id, error = %err, "could not store upgraded verifier"),
        }
    }

    fn hash(&self, password: &str) -> Result<String, Error> {
        self.hasher.hash(password).map_err(|err| {
            tracing::error!(error = %err, "password hashing failed");
            Error::internal("password hashing failed")
        })
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

fn user_not_found(id: UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
