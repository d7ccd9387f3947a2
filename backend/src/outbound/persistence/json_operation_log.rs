//! `operations.json` adapter for [`OperationLog`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{OperationLog, OperationLogError};
use crate::domain::{OperationId, OperationRecord};

use super::json_collection::{Change, JsonCollection};

/// Operation log stored in `operations.json`.
pub struct JsonOperationLog {
    rows: JsonCollection<OperationRecord>,
}

impl JsonOperationLog {
    /// Log over `rows`.
    pub fn new(rows: JsonCollection<OperationRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl OperationLog for JsonOperationLog {
    async fn find(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<OperationRecord>, OperationLogError> {
        Ok(self
            .rows
            .load()
            .await
            .into_iter()
            .find(|entry| entry.op_id == *op_id))
    }

    async fn record(&self, entry: OperationRecord) -> Result<(), OperationLogError> {
        self.rows
            .update(|entries| {
                entries.retain(|existing| existing.op_id != entry.op_id);
                entries.push(entry);
                Change::Write(())
            })
            .await
            .map_err(|err| OperationLogError::storage(err.to_string()))
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, OperationLogError> {
        self.rows
            .update(|entries| {
                let before = entries.len();
                entries.retain(|entry| !entry.is_older_than(cutoff));
                match before - entries.len() {
                    0 => Change::Keep(0),
                    removed => Change::Write(removed),
                }
            })
            .await
            .map_err(|err| OperationLogError::storage(err.to_string()))
    }
}
