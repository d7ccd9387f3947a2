//! Payload fingerprints for operation replay checks.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Failures producing or parsing a [`PayloadHash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    /// The stored text was not 64 hexadecimal characters.
    #[error("payload hash must be 64 hexadecimal characters")]
    InvalidHex,
    /// The canonical payload could not be serialised.
    #[error("failed to serialise canonical payload: {message}")]
    Serialization {
        /// Serializer error text.
        message: String,
    },
}

/// SHA-256 digest of a canonicalised request payload, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Wrap a raw digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Lowercase hexadecimal encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for PayloadHash {
    type Error = PayloadHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(value.trim()).map_err(|_| PayloadHashError::InvalidHex)?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PayloadHashError::InvalidHex)?;
        Ok(Self(digest))
    }
}

impl From<PayloadHash> for String {
    fn from(value: PayloadHash) -> Self {
        value.to_hex()
    }
}

/// Hash `value` after sorting object keys recursively.
///
/// # Examples
/// ```
/// use medrep::domain::canonicalize_and_hash;
/// use serde_json::json;
///
/// let a = canonicalize_and_hash(&json!({"doctor": "Dr. A", "date": "2024-05-01"})).unwrap();
/// let b = canonicalize_and_hash(&json!({"date": "2024-05-01", "doctor": "Dr. A"})).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let bytes = serde_json::to_vec(&canonical(value)).map_err(|err| {
        PayloadHashError::Serialization {
            message: err.to_string(),
        }
    })?;
    Ok(PayloadHash(Sha256::digest(&bytes).into()))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), canonical(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        scalar => scalar.clone(),
    }
}
