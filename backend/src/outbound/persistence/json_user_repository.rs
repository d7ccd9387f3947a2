//! `users.json` adapter for [`UserRepository`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    DisplayName, NewUser, Role, User, UserAccount, UserChanges, UserId, Username, next_id,
};

use super::json_collection::{Change, JsonCollection};
use super::StoreError;

/// On-disk account row; the verifier lives under `pass`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserRow {
    id: UserId,
    name: DisplayName,
    username: Username,
    pass: String,
    role: Role,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            user: User {
                id: row.id,
                name: row.name,
                username: row.username,
                role: row.role,
            },
            verifier: row.pass,
        }
    }
}

impl From<UserAccount> for UserRow {
    fn from(account: UserAccount) -> Self {
        let UserAccount { user, verifier } = account;
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            pass: verifier,
            role: user.role,
        }
    }
}

/// Accounts stored in `users.json`.
pub struct JsonUserRepository {
    rows: JsonCollection<UserRow>,
}

impl JsonUserRepository {
    /// Repository over `collection`.
    pub(crate) fn new(rows: JsonCollection<UserRow>) -> Self {
        Self { rows }
    }

    /// Whether `users.json` has been created.
    pub fn is_initialised(&self) -> bool {
        self.rows.exists()
    }

    async fn accounts(&self) -> Vec<UserAccount> {
        self.rows
            .load()
            .await
            .into_iter()
            .map(UserAccount::from)
            .collect()
    }
}

fn storage(err: StoreError) -> UserRepositoryError {
    UserRepositoryError::storage(err.to_string())
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn list(&self) -> Result<Vec<UserAccount>, UserRepositoryError> {
        Ok(self.accounts().await)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self
            .accounts()
            .await
            .into_iter()
            .find(|account| account.user.id == id))
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self
            .accounts()
            .await
            .into_iter()
            .find(|account| account.user.username == *username))
    }

    async fn insert(&self, user: NewUser) -> Result<UserAccount, UserRepositoryError> {
        self.rows
            .update(|rows| {
                if rows.iter().any(|row| row.username == user.username) {
                    return Change::Keep(Err(UserRepositoryError::duplicate_username(
                        user.username.as_str(),
                    )));
                }
                let accounts: Vec<UserAccount> =
                    rows.iter().cloned().map(UserAccount::from).collect();
                let account = UserAccount {
                    user: User {
                        id: UserId::new(next_id(&accounts)),
                        name: user.name,
                        username: user.username,
                        role: user.role,
                    },
                    verifier: user.verifier,
                };
                rows.push(UserRow::from(account.clone()));
                Change::Write(Ok(account))
            })
            .await
            .map_err(storage)?
    }

    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        self.rows
            .update(|rows| {
                let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
                    return Change::Keep(None);
                };
                let mut account = UserAccount::from(row.clone());
                if changes.is_empty() {
                    return Change::Keep(Some(account));
                }
                changes.apply_to(&mut account);
                *row = UserRow::from(account.clone());
                Change::Write(Some(account))
            })
            .await
            .map_err(storage)
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        self.rows
            .update(|rows| {
                let before = rows.len();
                rows.retain(|row| row.id != id);
                if rows.len() == before {
                    Change::Keep(false)
                } else {
                    Change::Write(true)
                }
            })
            .await
            .map_err(storage)
    }
}
