//! Durable client-side queue for medrep writes.
//!
//! Field staff log visits from places with patchy connectivity. A write is
//! tagged with an operation id and capture time, sent once, and kept in a
//! local queue when the server cannot be reached. Flushing replays queued
//! writes in order; the server applies each operation id exactly once, so a
//! retry after a lost response is harmless.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use mockable::DefaultClock;
//! use offline_queue::{
//!     DeliveryError, MemoryQueueStore, OfflineQueue, SendOutcome, Transport,
//! };
//! use serde_json::{Value, json};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl Transport for Offline {
//!     async fn deliver(&self, _: &str, _: &Value) -> Result<Value, DeliveryError> {
//!         Err(DeliveryError::Network { message: "offline".to_owned() })
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
//! let store = MemoryQueueStore::new();
//! let queue = OfflineQueue::new(Arc::new(store.clone()), Arc::new(Offline), Arc::new(DefaultClock));
//!
//! let outcome = queue
//!     .enqueue_or_send("/api/visits", json!({"date": "2024-04-02", "doctor": "Dr. A"}))
//!     .await
//!     .expect("queued");
//!
//! assert!(matches!(outcome, SendOutcome::Queued { .. }));
//! assert_eq!(store.snapshot().len(), 1);
//! # });
//! ```

mod atomic_io;
mod entry;
mod error;
mod queue;
mod store;
mod transport;
mod triggers;

pub use entry::{CLIENT_TS_FIELD, OP_ID_FIELD, QueuedOperation, tag_payload};
pub use error::{DeliveryError, QueueError, QueueStoreError};
pub use queue::{FlushReport, OfflineQueue, SendOutcome};
pub use store::{FileQueueStore, MemoryQueueStore, QueueStore};
pub use transport::{HttpTransport, Transport};
pub use triggers::{FlushTrigger, run_triggers};
