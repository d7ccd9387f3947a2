//! Exactly-once application of client writes tagged with an operation id.
//!
//! Every tagged write runs check → mutate → record while holding one async
//! gate, so two requests carrying the same `op_id` cannot both apply. The
//! gate is always taken before any collection lock.
//!
//! The domain record is stamped with its `op_id` in the same file write that
//! creates it. If the process dies before the log entry lands, the next retry
//! finds the stamped record, back-fills the log and replays.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::ports::{OperationLog, OperationLogError};
use super::{Error, OperationId, OperationKind, OperationRecord, PayloadHash, UserId};

/// A collection that can apply and recognise tagged writes.
#[async_trait]
pub trait OperationTarget: Send + Sync {
    /// Validated request data.
    type Input: Send;
    /// Record produced by a fresh application.
    type Output: Send;

    /// Which write this target performs.
    const KIND: OperationKind;

    /// Identifier of a record already stamped with `op_id`.
    async fn find_applied(&self, op_id: &OperationId) -> Result<Option<u64>, Error>;

    /// Apply the write, stamping the record with `op_id`.
    async fn apply(
        &self,
        input: Self::Input,
        op_id: Option<OperationId>,
    ) -> Result<Self::Output, Error>;

    /// Identifier of the produced record.
    fn result_id(output: &Self::Output) -> u64;
}

/// A write request, optionally tagged for deduplication.
#[derive(Debug, Clone)]
pub struct TaggedWrite<I> {
    /// Caller issuing the write.
    pub user_id: UserId,
    /// Client operation id, if supplied.
    pub op_id: Option<OperationId>,
    /// Fingerprint of the request payload.
    pub payload_hash: PayloadHash,
    /// Validated request data.
    pub input: I,
}

/// Result of an idempotent write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
    /// The write was applied now.
    Applied(T),
    /// The operation id had already been applied; nothing changed.
    Replayed {
        /// Identifier of the record the original write produced.
        result_id: u64,
    },
}

impl<T> WriteOutcome<T> {
    /// Whether the call was a replay.
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed { .. })
    }
}

/// Serialises tagged writes and maintains the operation log.
pub struct IdempotentWriter {
    gate: Mutex<()>,
    log: Arc<dyn OperationLog>,
    clock: Arc<dyn Clock>,
}

impl IdempotentWriter {
    /// Create a writer backed by `log`.
    pub fn new(log: Arc<dyn OperationLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gate: Mutex::new(()),
            log,
            clock,
        }
    }

    /// Apply `write` through `target` at most once per operation id.
    pub async fn execute<T: OperationTarget>(
        &self,
        target: &T,
        write: TaggedWrite<T::Input>,
    ) -> Result<WriteOutcome<T::Output>, Error> {
        let TaggedWrite {
            user_id,
            op_id,
            payload_hash,
            input,
        } = write;
        let Some(op_id) = op_id else {
            return target.apply(input, None).await.map(WriteOutcome::Applied);
        };

        let _guard = self.gate.lock().await;

        if let Some(existing) = self.log.find(&op_id).await.map_err(map_log_error)? {
            if existing.kind != T::KIND || existing.user_id != user_id {
                warn!(
                    op_id = %op_id,
                    recorded_kind = existing.kind.as_str(),
                    requested_kind = T::KIND.as_str(),
                    recorded_user = %existing.user_id,
                    requested_user = %user_id,
                    "operation id reused for a different write"
                );
                return Err(Error::conflict("operation id already used for a different write"));
            }
            if existing.payload_hash != payload_hash {
                warn!(
                    op_id = %op_id,
                    kind = T::KIND.as_str(),
                    "operation replayed with a different payload; keeping original"
                );
            }
            return Ok(WriteOutcome::Replayed {
                result_id: existing.result_id,
            });
        }

        if let Some(result_id) = target.find_applied(&op_id).await? {
            info!(
                op_id = %op_id,
                kind = T::KIND.as_str(),
                result_id,
                "back-filling operation log from stamped record"
            );
            self.record(op_id, T::KIND, user_id, result_id, payload_hash)
                .await;
            return Ok(WriteOutcome::Replayed { result_id });
        }

        let output = target.apply(input, Some(op_id.clone())).await?;
        let result_id = T::result_id(&output);
        self.record(op_id, T::KIND, user_id, result_id, payload_hash)
            .await;
        Ok(WriteOutcome::Applied(output))
    }

    /// Drop log entries older than `retention`; stamped records keep
    /// de-duplicating after their entries are gone.
    pub async fn prune(&self, retention: chrono::Duration) -> Result<usize, Error> {
        let _guard = self.gate.lock().await;
        let cutoff = self.clock.utc() - retention;
        self.log.prune_before(cutoff).await.map_err(map_log_error)
    }

    async fn record(
        &self,
        op_id: OperationId,
        kind: OperationKind,
        user_id: UserId,
        result_id: u64,
        payload_hash: PayloadHash,
    ) {
        let entry = OperationRecord {
            op_id,
            kind,
            user_id,
            result_id,
            payload_hash,
            recorded_at: self.clock.utc(),
        };
        let op_id = entry.op_id.clone();
        // A lost entry is recovered later from the stamped record.
        if let Err(err) = self.log.record(entry).await {
            warn!(op_id = %op_id, error = %err, "failed to append operation log entry");
        }
    }
}

fn map_log_error(error: OperationLogError) -> Error {
    Error::storage(error)
}

#[cfg(test)]
#[path = "idempotent_writer_tests.rs"]
mod tests;
