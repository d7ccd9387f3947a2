//! `visits.json` adapter for [`VisitRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{VisitRepository, VisitRepositoryError};
use crate::domain::{OperationId, UserId, Visit, VisitDraft, VisitId, next_id};

use super::json_collection::{Change, JsonCollection};

/// Append-only visits stored in `visits.json`.
pub struct JsonVisitRepository {
    rows: JsonCollection<Visit>,
}

impl JsonVisitRepository {
    /// Repository over `rows`.
    pub fn new(rows: JsonCollection<Visit>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl VisitRepository for JsonVisitRepository {
    async fn list(&self) -> Result<Vec<Visit>, VisitRepositoryError> {
        Ok(self.rows.load().await)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Visit>, VisitRepositoryError> {
        let mut visits = self.rows.load().await;
        visits.retain(|visit| visit.user_id == user_id);
        Ok(visits)
    }

    async fn find_by_operation(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<Visit>, VisitRepositoryError> {
        Ok(self
            .rows
            .load()
            .await
            .into_iter()
            .find(|visit| visit.op_id.as_ref() == Some(op_id)))
    }

    async fn append(
        &self,
        user_id: UserId,
        draft: VisitDraft,
        op_id: Option<OperationId>,
        created_at: DateTime<Utc>,
    ) -> Result<Visit, VisitRepositoryError> {
        self.rows
            .update(|visits| {
                let visit = Visit {
                    id: VisitId::new(next_id(visits)),
                    user_id,
                    date: draft.date,
                    doctor: draft.doctor,
                    product_id: draft.product_id,
                    note: draft.note,
                    created_at,
                    client_ts: draft.client_ts,
                    op_id,
                };
                visits.push(visit.clone());
                Change::Write(visit)
            })
            .await
            .map_err(|err| VisitRepositoryError::storage(err.to_string()))
    }
}
