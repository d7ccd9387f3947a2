//! Operations waiting in the queue and how payloads are tagged.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::QueueError;

/// Body field carrying the operation id.
pub const OP_ID_FIELD: &str = "op_id";
/// Body field carrying the client capture time.
pub const CLIENT_TS_FIELD: &str = "client_ts";

/// One write waiting for delivery.
///
/// The payload is stored exactly as it was first sent, `op_id` and
/// `client_ts` included, so a retry is recognised by the server as the same
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Operation id also present in `payload`.
    pub op_id: String,
    /// Path relative to the server base URL, e.g. `/api/visits`.
    pub endpoint: String,
    /// Tagged JSON body.
    pub payload: Value,
    /// When the operation was queued.
    pub queued_at: DateTime<Utc>,
}

/// Attach `op_id` and `client_ts` to an object payload.
///
/// A non-empty string `op_id` already present is kept; otherwise a fresh
/// UUID v4 is generated. An existing `client_ts` is kept as well.
///
/// # Errors
///
/// Returns [`QueueError::NotAnObject`] when `payload` is not a JSON object.
pub fn tag_payload(payload: Value, now: DateTime<Utc>) -> Result<(String, Value), QueueError> {
    let Value::Object(mut fields) = payload else {
        return Err(QueueError::NotAnObject);
    };
    let op_id = existing_op_id(&fields).unwrap_or_else(|| Uuid::new_v4().to_string());
    fields.insert(OP_ID_FIELD.to_owned(), Value::String(op_id.clone()));
    fields
        .entry(CLIENT_TS_FIELD)
        .or_insert_with(|| Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)));
    Ok((op_id, Value::Object(fields)))
}

fn existing_op_id(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get(OP_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|op_id| !op_id.trim().is_empty())
        .map(str::to_owned)
}
