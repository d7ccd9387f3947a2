//! Operation identifiers and the log that makes client retries safe.
//!
//! - [`OperationId`]: opaque client token sent as the `op_id` body field or
//!   the `Idempotency-Key` header.
//! - [`OperationKind`]: which write the token guarded.
//! - [`PayloadHash`]: SHA-256 of the canonicalised request payload, used to
//!   spot a token reused for a different request.
//! - [`OperationRecord`]: durable evidence that a write was applied once.
//!
//! Canonicalisation sorts object keys recursively and serialises compactly
//! before hashing, so key order and whitespace never change the hash.

mod id;
mod payload;
mod record;

pub use id::{OPERATION_ID_MAX, OperationId, OperationIdError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash};
pub use record::{OperationKind, OperationRecord};
