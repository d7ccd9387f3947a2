//! Send-or-queue writes and flush the queue once the server is reachable.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mockable::Clock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::entry::{QueuedOperation, tag_payload};
use crate::error::QueueError;
use crate::store::QueueStore;
use crate::transport::Transport;

/// Result of [`OfflineQueue::enqueue_or_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server accepted the write.
    Delivered {
        /// Operation id attached to the payload.
        op_id: String,
        /// JSON answer from the server.
        response: Value,
    },
    /// Delivery failed; the write waits in the queue.
    Queued {
        /// Operation id attached to the payload.
        op_id: String,
    },
}

/// Summary of one [`OfflineQueue::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries the server accepted and that were removed.
    pub delivered: usize,
    /// Entries that failed again and stay queued.
    pub failed: usize,
    /// Entries left in the queue afterwards.
    pub remaining: usize,
    /// Another flush was already running, so nothing was attempted.
    pub skipped: bool,
}

impl FlushReport {
    /// Report for a flush that did not run.
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            delivered: 0,
            failed: 0,
            remaining: 0,
            skipped: true,
        }
    }
}

/// Clears the in-flight flag when a flush ends, however it ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client-side queue of writes that could not be delivered.
///
/// Read-modify-write cycles on the store are serialised by one lock, and no
/// network call happens while it is held. At most one flush runs at a time.
pub struct OfflineQueue {
    store: Arc<dyn QueueStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    queue_lock: Mutex<()>,
    flushing: AtomicBool,
}

impl OfflineQueue {
    /// Queue over `store`, delivering through `transport`.
    pub fn new(
        store: Arc<dyn QueueStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            queue_lock: Mutex::new(()),
            flushing: AtomicBool::new(false),
        }
    }

    /// Tag `payload` with `op_id` and `client_ts`, try to deliver it once
    /// and queue it when delivery fails.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotAnObject`] for non-object payloads and
    /// [`QueueError::Store`] when a failed write cannot be queued.
    pub async fn enqueue_or_send(
        &self,
        endpoint: &str,
        payload: Value,
    ) -> Result<SendOutcome, QueueError> {
        let now = self.clock.utc();
        let (op_id, payload) = tag_payload(payload, now)?;
        match self.transport.deliver(endpoint, &payload).await {
            Ok(response) => Ok(SendOutcome::Delivered { op_id, response }),
            Err(err) => {
                warn!(%op_id, endpoint, error = %err, "delivery failed; queueing operation");
                let entry = QueuedOperation {
                    op_id: op_id.clone(),
                    endpoint: endpoint.to_owned(),
                    payload,
                    queued_at: now,
                };
                let _lock = self.queue_lock.lock().await;
                let mut entries = self.store.load().await?;
                entries.push(entry);
                self.store.save(&entries).await?;
                Ok(SendOutcome::Queued { op_id })
            }
        }
    }

    /// Retry every queued operation in insertion order.
    ///
    /// Delivered entries are removed; failed entries stay, in their
    /// original order, together with anything queued meanwhile. A call made
    /// while another flush is running returns [`FlushReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Store`] when the queue cannot be read or saved.
    pub async fn flush(&self) -> Result<FlushReport, QueueError> {
        if self.flushing.swap(true, Ordering::AcqRel) {
            debug!("flush already running");
            return Ok(FlushReport::skipped());
        }
        let _guard = FlushGuard(&self.flushing);

        let pending = {
            let _lock = self.queue_lock.lock().await;
            self.store.load().await?
        };
        if pending.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut delivered = HashSet::new();
        let mut failed = 0;
        for entry in &pending {
            match self.transport.deliver(&entry.endpoint, &entry.payload).await {
                Ok(_) => {
                    delivered.insert(entry.op_id.clone());
                }
                Err(err) => {
                    failed += 1;
                    warn!(op_id = %entry.op_id, endpoint = %entry.endpoint, error = %err, "queued operation still undeliverable");
                }
            }
        }

        let remaining = {
            let _lock = self.queue_lock.lock().await;
            let mut entries = self.store.load().await?;
            entries.retain(|entry| !delivered.contains(&entry.op_id));
            self.store.save(&entries).await?;
            entries.len()
        };
        info!(delivered = delivered.len(), failed, remaining, "flushed offline queue");
        Ok(FlushReport {
            delivered: delivered.len(),
            failed,
            remaining,
            skipped: false,
        })
    }

    /// Number of operations waiting in the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Store`] when the queue cannot be read.
    pub async fn pending(&self) -> Result<usize, QueueError> {
        let _lock = self.queue_lock.lock().await;
        Ok(self.store.load().await?.len())
    }
}
