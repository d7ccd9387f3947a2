//! Port for the durable operation log.
//!
//! The log records which client operation ids have been applied. Entries are
//! only ever appended by the idempotent writer and pruned at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{OperationId, OperationRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by operation log adapters.
    pub enum OperationLogError {
        /// The backing store could not be written.
        Storage { message } => "operation log write failed: {message}",
    }
}

/// Durable record of applied operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperationLog: Send + Sync {
    /// Entry recorded for `op_id`.
    async fn find(&self, op_id: &OperationId)
    -> Result<Option<OperationRecord>, OperationLogError>;

    /// Append an entry.
    async fn record(&self, entry: OperationRecord) -> Result<(), OperationLogError>;

    /// Drop entries recorded before `cutoff`, returning how many were removed.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, OperationLogError>;
}
