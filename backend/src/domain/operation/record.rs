//! Durable operation log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OperationId, PayloadHash};
use crate::domain::UserId;

/// Which idempotent write an operation identifier guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Admin plan upsert keyed on `(user_id, week_start)`.
    PlanUpsert,
    /// Visit creation by a rep or advisor.
    VisitCreate,
}

impl OperationKind {
    /// Wire name used in logs and the operation file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlanUpsert => "plan_upsert",
            Self::VisitCreate => "visit_create",
        }
    }
}

/// Evidence that the write identified by `op_id` was applied exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Client token.
    pub op_id: OperationId,
    /// Guarded write.
    pub kind: OperationKind,
    /// Caller that issued the write.
    pub user_id: UserId,
    /// Identifier of the record the write produced.
    pub result_id: u64,
    /// Fingerprint of the payload that was applied.
    pub payload_hash: PayloadHash,
    /// When the entry was logged.
    pub recorded_at: DateTime<Utc>,
}

impl OperationRecord {
    /// Whether the entry is older than `cutoff`.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.recorded_at < cutoff
    }
}
