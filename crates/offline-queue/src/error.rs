//! Error types for the offline-queue crate.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by durable queue storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueStoreError {
    /// The queue file could not be read.
    #[error("failed to read queue file at '{path}': {message}")]
    Read {
        /// Path to the queue file.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The queue file exists but does not hold a queue.
    #[error("queue file at '{path}' is malformed: {message}")]
    Malformed {
        /// Path to the queue file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// The queue file could not be written.
    #[error("failed to write queue file at '{path}': {message}")]
    Write {
        /// Path to the queue file.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },
}

/// Errors raised while delivering one operation to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The request never produced a response.
    #[error("network failure: {message}")]
    Network {
        /// Description of the transport error.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("server answered {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Shortened response body.
        body: String,
    },

    /// The endpoint could not be resolved against the base URL.
    #[error("invalid endpoint '{endpoint}': {message}")]
    Endpoint {
        /// Endpoint as given by the caller.
        endpoint: String,
        /// Description of the URL error.
        message: String,
    },

    /// The response body was not JSON.
    #[error("undecodable response: {message}")]
    Decode {
        /// Description of the parse error.
        message: String,
    },
}

/// Errors surfaced by [`crate::OfflineQueue`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Only JSON objects can carry an operation id.
    #[error("queued payloads must be JSON objects")]
    NotAnObject,

    /// The durable queue could not be read or written.
    #[error(transparent)]
    Store(#[from] QueueStoreError),
}
