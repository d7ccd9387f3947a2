//! Port for weekly plan persistence.

use async_trait::async_trait;

use crate::domain::{OperationId, Plan, PlanDraft, UserId, WeekStart};

use super::define_port_error;

define_port_error! {
    /// Errors raised by plan repository adapters.
    pub enum PlanRepositoryError {
        /// The backing store could not be written.
        Storage { message } => "plan store write failed: {message}",
    }
}

/// Weekly plan storage with at most one plan per `(user, week)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Plan for `user_id` starting on `week_start`.
    async fn find(
        &self,
        user_id: UserId,
        week_start: WeekStart,
    ) -> Result<Option<Plan>, PlanRepositoryError>;

    /// Every plan for `user_id`, oldest week first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Plan>, PlanRepositoryError>;

    /// Plan that `op_id` was ever applied to, even if later upserts
    /// replaced its items.
    async fn find_by_operation(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<Plan>, PlanRepositoryError>;

    /// Replace the plan occupying the draft's `(user, week)` slot in place,
    /// keeping its id, or append a new plan.
    async fn upsert(
        &self,
        draft: PlanDraft,
        op_id: Option<OperationId>,
    ) -> Result<Plan, PlanRepositoryError>;
}
