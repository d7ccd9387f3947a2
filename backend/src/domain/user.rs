//! User accounts and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::record_id::{Identified, record_id};
use super::validation::{FieldError, FieldErrorCode, bounded, required_text};

record_id! {
    /// Positive integer identifying a user account.
    UserId
}

/// Longest accepted username.
pub const USERNAME_MAX: usize = 64;
/// Longest accepted display name.
pub const DISPLAY_NAME_MAX: usize = 120;

/// Access role attached to every account.
///
/// Only two authorisation classes exist: [`Role::Admin`] and everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages users, products, plans and company-wide reports.
    Admin,
    /// Medical representative logging doctor visits.
    Rep,
    /// Pharmacy advisor logging pharmacy visits.
    #[serde(alias = "pharma")]
    Advisor,
}

impl Role {
    /// Whether this role passes admin-only gates.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Role granted to a self-registered account.
    ///
    /// Self-registration can never produce an administrator: anything other
    /// than an advisor request yields [`Role::Rep`].
    ///
    /// # Examples
    /// ```
    /// use medrep::domain::Role;
    ///
    /// assert_eq!(Role::for_registration(Some("pharma")), Role::Advisor);
    /// assert_eq!(Role::for_registration(Some("admin")), Role::Rep);
    /// assert_eq!(Role::for_registration(None), Role::Rep);
    /// ```
    pub fn for_registration(requested: Option<&str>) -> Self {
        match requested.map(str::parse::<Self>) {
            Some(Ok(Self::Advisor)) => Self::Advisor,
            _ => Self::Rep,
        }
    }

    /// Role chosen by an administrator; defaults to [`Role::Rep`] when absent.
    pub fn for_admin_assignment(requested: Option<&str>) -> Result<Self, FieldError> {
        match requested.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Ok(Self::Rep),
            Some(raw) => raw.parse(),
        }
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Rep => "rep",
            Self::Advisor => "advisor",
        }
    }
}

impl FromStr for Role {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "rep" => Ok(Self::Rep),
            "advisor" | "pharma" => Ok(Self::Advisor),
            _ => Err(FieldError::new(
                "role",
                FieldErrorCode::InvalidValue,
                "role must be one of admin, rep, advisor",
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique login name, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate a raw username.
    pub fn parse(raw: Option<&str>) -> Result<Self, FieldError> {
        let text = required_text(raw, "username")?;
        Ok(Self(bounded(text, "username", USERNAME_MAX)?))
    }

    /// Borrow the username.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(Some(&value))
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable name shown in reports and the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate a raw display name.
    pub fn parse(raw: Option<&str>) -> Result<Self, FieldError> {
        let text = required_text(raw, "name")?;
        Ok(Self(bounded(text, "name", DISPLAY_NAME_MAX)?))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(Some(&value))
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public view of an account; never carries the password verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Account identifier.
    pub id: UserId,
    /// Display name.
    #[schema(value_type = String, example = "Sara Karimi")]
    pub name: DisplayName,
    /// Login name.
    #[schema(value_type = String, example = "sara")]
    pub username: Username,
    /// Access role.
    pub role: Role,
}

/// Stored account: the public profile plus its password verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Public profile.
    pub user: User,
    /// PHC string (Argon2id) or legacy SHA-256 hex digest.
    pub verifier: String,
}

impl Identified for UserAccount {
    fn raw_id(&self) -> u64 {
        self.user.id.get()
    }
}

/// Validated account fields before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: DisplayName,
    /// Login name.
    pub username: Username,
    /// Access role.
    pub role: Role,
    /// Hashed password.
    pub verifier: String,
}

/// Partial update applied by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// Replacement display name.
    pub name: Option<DisplayName>,
    /// Replacement role.
    pub role: Option<Role>,
    /// Replacement password verifier.
    pub verifier: Option<String>,
}

impl UserChanges {
    /// Whether applying the changes would be a no-op.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.verifier.is_none()
    }

    /// Apply the changes to `account` in place.
    pub fn apply_to(self, account: &mut UserAccount) {
        if let Some(name) = self.name {
            account.user.name = name;
        }
        if let Some(role) = self.role {
            account.user.role = role;
        }
        if let Some(verifier) = self.verifier {
            account.verifier = verifier;
        }
    }
}
