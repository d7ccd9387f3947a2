//! Client-generated operation identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest accepted operation identifier.
pub const OPERATION_ID_MAX: usize = 128;

/// Validation errors for [`OperationId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OperationIdError {
    /// The identifier was empty.
    #[error("op_id must not be empty")]
    Empty,
    /// The identifier exceeded [`OPERATION_ID_MAX`] characters.
    #[error("op_id must be at most {OPERATION_ID_MAX} characters")]
    TooLong,
    /// The identifier contained whitespace, control or non-ASCII characters.
    #[error("op_id must contain only visible ASCII characters")]
    InvalidCharacters,
}

/// Opaque token a client attaches to a write so retries apply it once.
///
/// The server never interprets the token; the offline queue uses UUID v4
/// strings but any 1–128 visible ASCII characters are accepted.
///
/// # Examples
/// ```
/// use medrep::domain::OperationId;
///
/// let id = OperationId::new("7f0c2a4e-visit-1").unwrap();
/// assert_eq!(id.as_str(), "7f0c2a4e-visit-1");
/// assert!(OperationId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationId(String);

impl OperationId {
    /// Validate and wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Result<Self, OperationIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(OperationIdError::Empty);
        }
        if raw.len() > OPERATION_ID_MAX {
            return Err(OperationIdError::TooLong);
        }
        if !raw.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(OperationIdError::InvalidCharacters);
        }
        Ok(Self(raw))
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OperationId {
    type Error = OperationIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OperationId> for String {
    fn from(value: OperationId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a")]
    #[case("550e8400-e29b-41d4-a716-446655440000")]
    #[case("retry#3:visit/42")]
    fn accepts_visible_ascii(#[case] raw: &str) {
        assert_eq!(OperationId::new(raw).map(|id| id.to_string()), Ok(raw.to_owned()));
    }

    #[rstest]
    #[case("", OperationIdError::Empty)]
    #[case("two words", OperationIdError::InvalidCharacters)]
    #[case("tab\there", OperationIdError::InvalidCharacters)]
    #[case("ویزیت", OperationIdError::InvalidCharacters)]
    fn rejects_invalid_tokens(#[case] raw: &str, #[case] expected: OperationIdError) {
        assert_eq!(OperationId::new(raw), Err(expected));
    }

    #[rstest]
    fn enforces_length_bound() {
        assert!(OperationId::new("x".repeat(OPERATION_ID_MAX)).is_ok());
        assert_eq!(
            OperationId::new("x".repeat(OPERATION_ID_MAX + 1)),
            Err(OperationIdError::TooLong)
        );
    }
}
