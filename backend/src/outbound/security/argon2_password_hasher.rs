//! Argon2id adapter for [`PasswordHasher`] with legacy SHA-256 support.
//!
//! New verifiers are Argon2id PHC strings. Data files written by earlier
//! deployments hold unsalted SHA-256 hex digests; those still verify, and
//! report `needs_rehash` so the login path can replace them.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::domain::ports::{PasswordCheck, PasswordHasher, PasswordHasherError};

const LEGACY_DIGEST_LEN: usize = 64;

/// Argon2id hasher using the crate's default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Hasher with default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_legacy_digest(verifier: &str) -> bool {
    verifier.len() == LEGACY_DIGEST_LEN && verifier.bytes().all(|byte| byte.is_ascii_hexdigit())
}

fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHasherError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHasherError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, verifier: &str) -> PasswordCheck {
        if is_legacy_digest(verifier) {
            return if legacy_digest(password).eq_ignore_ascii_case(verifier) {
                PasswordCheck::Valid { needs_rehash: true }
            } else {
                PasswordCheck::Invalid
            };
        }
        let Ok(parsed) = PasswordHash::new(verifier) else {
            return PasswordCheck::Invalid;
        };
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => PasswordCheck::Valid {
                needs_rehash: parsed.algorithm != argon2::Algorithm::Argon2id.ident(),
            },
            Err(_) => PasswordCheck::Invalid,
        }
    }
}
