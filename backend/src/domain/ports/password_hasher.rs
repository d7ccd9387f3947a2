//! Port for password verifier generation and checking.

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHasherError {
        /// The hashing primitive failed.
        Hash { message } => "password hashing failed: {message}",
    }
}

/// Outcome of checking a password against a stored verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// The password matches.
    Valid {
        /// The verifier uses an outdated scheme and should be replaced.
        needs_rehash: bool,
    },
    /// The password does not match, or the verifier is unreadable.
    Invalid,
}

/// Password hashing primitive.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a verifier for `password`.
    fn hash(&self, password: &str) -> Result<String, PasswordHasherError>;

    /// Check `password` against `verifier`.
    fn verify(&self, password: &str, verifier: &str) -> PasswordCheck;
}
