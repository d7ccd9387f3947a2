//! Authentication primitives: login credentials and session claims.
//!
//! Inbound adapters build [`LoginCredentials`] from raw strings before talking
//! to the account service. Authenticated requests carry [`SessionClaims`],
//! which expire a fixed time after they were issued.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::validation::{FieldError, required_text};
use super::{Error, Role, User, UserId};

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty; surrounding whitespace is kept verbatim.
///
/// # Examples
/// ```
/// use medrep::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(Some(" admin "), Some("secret")).unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from optional raw inputs.
    pub fn try_from_parts(
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, FieldError> {
        let username = required_text(username, "username")?;
        let password = password_text(password)?;
        Ok(Self { username, password })
    }

    /// Username used for the account lookup.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reject an absent or empty password, keeping its bytes zeroized on drop.
pub fn password_text(password: Option<&str>) -> Result<Zeroizing<String>, FieldError> {
    match password {
        Some(raw) if !raw.is_empty() => Ok(Zeroizing::new(raw.to_owned())),
        _ => Err(FieldError::missing("password")),
    }
}

/// Identity carried by an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Authenticated account.
    pub user_id: UserId,
    /// Login name at the time of issue.
    pub username: String,
    /// Display name at the time of issue.
    pub name: String,
    /// Role at the time of issue.
    pub role: Role,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Claims for `user`, issued at `now`.
    pub fn issue(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            username: user.username.as_str().to_owned(),
            name: user.name.as_str().to_owned(),
            role: user.role,
            issued_at: now,
        }
    }

    /// Whether the claims are past their lifetime at `now`.
    ///
    /// A session is expired once `issued_at + ttl <= now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use medrep::domain::{Role, SessionClaims, UserId};
    ///
    /// let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    /// let claims = SessionClaims {
    ///     user_id: UserId::new(1),
    ///     username: "admin".into(),
    ///     name: "Admin".into(),
    ///     role: Role::Admin,
    ///     issued_at,
    /// };
    /// let ttl = Duration::hours(12);
    /// assert!(!claims.is_expired(issued_at + Duration::hours(11), ttl));
    /// assert!(claims.is_expired(issued_at + ttl, ttl));
    /// ```
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.issued_at + ttl <= now
    }

    /// Fail with `403 Forbidden` unless the claims carry `role`.
    pub fn require_role(&self, role: Role) -> Result<(), Error> {
        require_role(self, role)
    }
}

/// Fail with `403 Forbidden` unless `claims` carry `role`.
pub fn require_role(claims: &SessionClaims, role: Role) -> Result<(), Error> {
    if claims.role == role {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{role} role required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("fixture timestamp")
    }

    fn claims(role: Role, issued_at: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            user_id: UserId::new(7),
            username: "sara".into(),
            name: "Sara".into(),
            role,
            issued_at,
        }
    }

    #[rstest]
    #[case(Some(""), Some("pw"), "username")]
    #[case(Some("   "), Some("pw"), "username")]
    #[case(None, Some("pw"), "username")]
    #[case(Some("sara"), Some(""), "password")]
    #[case(Some("sara"), None, "password")]
    fn credentials_reject_missing_parts(
        #[case] username: Option<&str>,
        #[case] password: Option<&str>,
        #[case] field: &str,
    ) {
        let err = LoginCredentials::try_from_parts(username, password).expect_err("invalid");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn credentials_keep_password_whitespace() {
        let creds = LoginCredentials::try_from_parts(Some("sara"), Some(" pw ")).expect("valid");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    #[case(Duration::hours(11), false)]
    #[case(Duration::hours(12), true)]
    #[case(Duration::hours(13), true)]
    fn expiry_is_inclusive_of_ttl(
        issued_at: DateTime<Utc>,
        #[case] elapsed: Duration,
        #[case] expired: bool,
    ) {
        let claims = claims(Role::Rep, issued_at);
        assert_eq!(claims.is_expired(issued_at + elapsed, Duration::hours(12)), expired);
    }

    #[rstest]
    fn require_role_forbids_other_roles(issued_at: DateTime<Utc>) {
        let err = claims(Role::Advisor, issued_at)
            .require_role(Role::Admin)
            .expect_err("advisor is not admin");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    fn require_role_admits_matching_role(issued_at: DateTime<Utc>) {
        assert!(claims(Role::Admin, issued_at).require_role(Role::Admin).is_ok());
    }
}
