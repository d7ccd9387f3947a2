//! Port for visit persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{OperationId, UserId, Visit, VisitDraft};

use super::define_port_error;

define_port_error! {
    /// Errors raised by visit repository adapters.
    pub enum VisitRepositoryError {
        /// The backing store could not be written.
        Storage { message } => "visit store write failed: {message}",
    }
}

/// Append-only visit storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Every visit in id order.
    async fn list(&self) -> Result<Vec<Visit>, VisitRepositoryError>;

    /// Visits authored by `user_id`, in id order.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Visit>, VisitRepositoryError>;

    /// Visit created by `op_id`.
    async fn find_by_operation(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<Visit>, VisitRepositoryError>;

    /// Append a visit with the next free id.
    async fn append(
        &self,
        user_id: UserId,
        draft: VisitDraft,
        op_id: Option<OperationId>,
        created_at: DateTime<Utc>,
    ) -> Result<Visit, VisitRepositoryError>;
}
