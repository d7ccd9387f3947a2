//! Delivery of queued operations to the server.
//!
//! [`HttpTransport`] owns transport details only: the cookie-carrying
//! client, endpoint resolution, status mapping and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};

use crate::entry::OP_ID_FIELD;
use crate::error::DeliveryError;

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
const LOGIN_ENDPOINT: &str = "/api/login";

/// Delivery port: send one JSON body and return the JSON answer.
///
/// Any non-success status is a failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` to `endpoint`.
    async fn deliver(&self, endpoint: &str, payload: &Value) -> Result<Value, DeliveryError>;
}

/// Transport posting to a medrep server with a persistent session cookie.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Sign in so later deliveries carry the session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the server rejects the credentials or
    /// cannot be reached.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, DeliveryError> {
        self.post(
            LOGIN_ENDPOINT,
            &json!({"username": username, "password": password}),
        )
        .await
    }

    async fn post(&self, endpoint: &str, payload: &Value) -> Result<Value, DeliveryError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|err| DeliveryError::Endpoint {
                endpoint: endpoint.to_owned(),
                message: err.to_string(),
            })?;
        let mut request = self.client.post(url).json(payload);
        if let Some(op_id) = payload.get(OP_ID_FIELD).and_then(Value::as_str) {
            request = request.header(IDEMPOTENCY_KEY_HEADER, op_id);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        decode_body(&body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, endpoint: &str, payload: &Value) -> Result<Value, DeliveryError> {
        self.post(endpoint, payload).await
    }
}

fn decode_body(body: &[u8]) -> Result<Value, DeliveryError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| DeliveryError::Decode {
        message: err.to_string(),
    })
}

fn map_transport_error(error: reqwest::Error) -> DeliveryError {
    DeliveryError::Network {
        message: error.to_string(),
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> DeliveryError {
    DeliveryError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
