//! Operation id extraction for idempotent writes.

use actix_web::http::header::HeaderMap;
use serde_json::{Value, json};

use crate::domain::{Error, OperationId, OperationIdError, PayloadHash, canonicalize_and_hash};

/// HTTP header carrying the operation id when the body has none.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
/// Body field carrying the operation id.
pub const OP_ID_FIELD: &str = "op_id";

/// Operation id and payload fingerprint of a tagged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRequest {
    pub op_id: Option<OperationId>,
    pub payload_hash: PayloadHash,
}

/// Read the operation id from `body.op_id`, falling back to the
/// `Idempotency-Key` header, and fingerprint the payload without it.
///
/// Blank or `null` body values count as absent.
pub fn tag_request(headers: &HeaderMap, body: &Value) -> Result<TaggedRequest, Error> {
    let op_id = match body.get(OP_ID_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) if raw.is_empty() => None,
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(_) => return Err(op_id_error("op_id must be a string")),
    };
    let op_id = match op_id {
        Some(raw) => Some(raw),
        None => header_op_id(headers)?,
    };
    let op_id = op_id
        .map(OperationId::new)
        .transpose()
        .map_err(map_operation_id_error)?;

    let mut payload = body.clone();
    if let Value::Object(map) = &mut payload {
        map.remove(OP_ID_FIELD);
    }
    let payload_hash = canonicalize_and_hash(&payload)
        .map_err(|err| Error::internal(format!("failed to fingerprint payload: {err}")))?;
    Ok(TaggedRequest {
        op_id,
        payload_hash,
    })
}

fn header_op_id(headers: &HeaderMap) -> Result<Option<String>, Error> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| op_id_error("idempotency-key header must be visible ASCII"))?;
    Ok(Some(text.to_owned()).filter(|text| !text.is_empty()))
}

/// Map operation id validation errors to domain errors.
pub fn map_operation_id_error(err: OperationIdError) -> Error {
    op_id_error(err.to_string())
}

fn op_id_error(message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": OP_ID_FIELD,
        "code": "invalid_value",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use rstest::rstest;

    fn headers(key: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(key) = key {
            map.insert(
                HeaderName::from_static("idempotency-key"),
                HeaderValue::from_str(key).expect("header value"),
            );
        }
        map
    }

    #[rstest]
    fn body_op_id_wins_over_header() {
        let tagged = tag_request(
            &headers(Some("from-header")),
            &json!({"op_id": "from-body", "doctor": "Dr. A"}),
        )
        .expect("tagged");
        assert_eq!(tagged.op_id.as_ref().map(OperationId::as_str), Some("from-body"));
    }

    #[rstest]
    #[case(json!({"doctor": "Dr. A"}))]
    #[case(json!({"op_id": null, "doctor": "Dr. A"}))]
    #[case(json!({"op_id": "", "doctor": "Dr. A"}))]
    fn header_is_used_when_body_has_none(#[case] body: Value) {
        let tagged = tag_request(&headers(Some("from-header")), &body).expect("tagged");
        assert_eq!(tagged.op_id.as_ref().map(OperationId::as_str), Some("from-header"));
    }

    #[rstest]
    fn untagged_requests_have_no_op_id() {
        let tagged = tag_request(&headers(None), &json!({})).expect("untagged");
        assert!(tagged.op_id.is_none());
    }

    #[rstest]
    #[case(json!({"op_id": 5}))]
    #[case(json!({"op_id": "has space"}))]
    #[case(json!({"op_id": "x".repeat(129)}))]
    fn invalid_op_ids_are_rejected(#[case] body: Value) {
        let err = tag_request(&headers(None), &body).expect_err("invalid op id");
        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(Value::as_str),
            Some("op_id")
        );
    }

    #[rstest]
    fn fingerprint_ignores_op_id_and_key_order() {
        let first = tag_request(
            &headers(None),
            &json!({"op_id": "a", "doctor": "Dr. A", "date": "2024-01-10"}),
        )
        .expect("first");
        let retry = tag_request(
            &headers(None),
            &json!({"date": "2024-01-10", "op_id": "b", "doctor": "Dr. A"}),
        )
        .expect("retry");
        assert_eq!(first.payload_hash, retry.payload_hash);
    }
}
