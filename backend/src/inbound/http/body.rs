//! Request body extraction.
//!
//! Browsers and the offline queue occasionally post empty or truncated
//! bodies. Such bodies are read as `{}` so the request fails field
//! validation with a precise `{field, code}` detail instead of a framework
//! parse error. A well-formed object whose fields have the wrong JSON types
//! is rejected as a whole.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::{Error, FieldError, FieldErrorCode};

/// JSON object body with malformed input treated as an empty object.
///
/// `raw` keeps the parsed object so callers can fingerprint the payload.
#[derive(Debug)]
pub struct LenientJson<T> {
    pub body: T,
    pub raw: Value,
}

impl<T: DeserializeOwned> LenientJson<T> {
    /// Decode `bytes` under the lenient policy.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let raw = match serde_json::from_slice::<Value>(bytes) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) | Err(_) => {
                if !bytes.is_empty() {
                    debug!(len = bytes.len(), "request body is not a JSON object; reading as {{}}");
                }
                Value::Object(Map::new())
            }
        };
        let body = serde_json::from_value(raw.clone()).map_err(|err| {
            Error::invalid_request(format!("request body has the wrong shape: {err}"))
                .with_details(json!({ "field": "body", "code": "invalid_value" }))
        })?;
        Ok(Self { body, raw })
    }

    pub fn into_inner(self) -> T {
        self.body
    }
}

impl<T: DeserializeOwned + 'static> FromRequest for LenientJson<T> {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let bytes = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let bytes = bytes.await?;
            Self::from_bytes(&bytes).map_err(actix_web::Error::from)
        })
    }
}

/// Record identifier accepted either as a JSON number or a numeric string.
///
/// HTML form controls post ids as strings; API clients send numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl LooseId {
    /// Resolve to a positive id; a blank string counts as absent.
    ///
    /// # Examples
    /// ```
    /// use medrep::inbound::http::body::LooseId;
    ///
    /// assert_eq!(LooseId::Text(" 7 ".into()).resolve("product_id").unwrap(), Some(7));
    /// assert_eq!(LooseId::Text("".into()).resolve("product_id").unwrap(), None);
    /// assert!(LooseId::Number(0).resolve("product_id").is_err());
    /// ```
    pub fn resolve(&self, field: &'static str) -> Result<Option<u64>, FieldError> {
        let parsed = match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) if text.trim().is_empty() => return Ok(None),
            Self::Text(text) => text.trim().parse::<i64>().ok(),
        };
        match parsed.and_then(|value| u64::try_from(value).ok()) {
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(FieldError::new(
                field,
                FieldErrorCode::InvalidValue,
                format!("{field} must be a positive integer"),
            )),
        }
    }
}

/// Resolve the first present id among `candidates`, reporting errors under
/// `field`.
pub fn resolve_id<'a>(
    field: &'static str,
    candidates: impl IntoIterator<Item = Option<&'a LooseId>>,
) -> Result<Option<u64>, FieldError> {
    for candidate in candidates.into_iter().flatten() {
        if let Some(id) = candidate.resolve(field)? {
            return Ok(Some(id));
        }
    }
    Ok(None)
}
