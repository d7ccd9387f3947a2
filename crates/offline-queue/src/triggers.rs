//! Flushes driven by connectivity and start-up signals.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::queue::OfflineQueue;

/// Signal that the queue may be deliverable now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Connectivity came back.
    Online,
    /// The client finished starting up.
    Loaded,
}

/// Flush `queue` once per received trigger until every sender is dropped.
///
/// Returns the number of flushes that ran, skipped ones excluded. Flush
/// failures are logged and do not stop the loop.
pub async fn run_triggers(
    queue: Arc<OfflineQueue>,
    mut triggers: mpsc::Receiver<FlushTrigger>,
) -> usize {
    let mut flushes = 0;
    while let Some(trigger) = triggers.recv().await {
        match queue.flush().await {
            Ok(report) if report.skipped => debug!(?trigger, "flush already running"),
            Ok(report) => {
                flushes += 1;
                debug!(?trigger, delivered = report.delivered, remaining = report.remaining, "triggered flush finished");
            }
            Err(err) => warn!(?trigger, error = %err, "triggered flush failed"),
        }
    }
    flushes
}
