//! Weekly plan management.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::idempotent_writer::{IdempotentWriter, OperationTarget, TaggedWrite, WriteOutcome};
use super::ports::{PlanRepository, UserRepository};
use super::validation::{FieldError, FieldErrorCode};
use super::{
    Error, OperationId, OperationKind, Plan, PlanDraft, PlanId, Role, SessionClaims, UserId,
    WeekStart,
};

/// Acknowledgement of a plan upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanReceipt {
    /// Plan identifier.
    pub id: PlanId,
    /// Week the plan covers.
    pub week_start: WeekStart,
    /// Whether the operation id had already been applied.
    pub replayed: bool,
}

/// Stores and serves weekly plans.
#[derive(Clone)]
pub struct PlanService {
    plans: Arc<dyn PlanRepository>,
    users: Arc<dyn UserRepository>,
    writer: Arc<IdempotentWriter>,
}

impl PlanService {
    /// Create the service.
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        users: Arc<dyn UserRepository>,
        writer: Arc<IdempotentWriter>,
    ) -> Self {
        Self {
            plans,
            users,
            writer,
        }
    }

    /// Create or replace the plan for the draft's `(user, week)`.
    pub async fn upsert(
        &self,
        caller: &SessionClaims,
        op_id: Option<OperationId>,
        payload_hash: super::PayloadHash,
        draft: PlanDraft,
    ) -> Result<PlanReceipt, Error> {
        caller.require_role(Role::Admin)?;
        let week_start = draft.week_start;
        let outcome = self
            .writer
            .execute(
                self,
                TaggedWrite {
                    user_id: caller.user_id,
                    op_id,
                    payload_hash,
                    input: draft,
                },
            )
            .await?;
        Ok(match outcome {
            WriteOutcome::Applied(plan) => PlanReceipt {
                id: plan.id,
                week_start: plan.week_start,
                replayed: false,
            },
            WriteOutcome::Replayed { result_id } => PlanReceipt {
                id: PlanId::new(result_id),
                week_start,
                replayed: true,
            },
        })
    }

    /// Plan for a user and week, if one exists.
    pub async fn plan_for(
        &self,
        caller: &SessionClaims,
        user_id: UserId,
        week_start: WeekStart,
    ) -> Result<Option<Plan>, Error> {
        caller.require_role(Role::Admin)?;
        self.plans
            .find(user_id, week_start)
            .await
            .map_err(Error::storage)
    }

    /// Every plan of a user.
    pub async fn plans_for(
        &self,
        caller: &SessionClaims,
        user_id: UserId,
    ) -> Result<Vec<Plan>, Error> {
        caller.require_role(Role::Admin)?;
        self.plans
            .list_for_user(user_id)
            .await
            .map_err(Error::storage)
    }

    /// The caller's own plan for a week.
    pub async fn my_plan(
        &self,
        caller: &SessionClaims,
        week_start: WeekStart,
    ) -> Result<Option<Plan>, Error> {
        self.plans
            .find(caller.user_id, week_start)
            .await
            .map_err(Error::storage)
    }
}

#[async_trait]
impl OperationTarget for PlanService {
    type Input = PlanDraft;
    type Output = Plan;

    const KIND: OperationKind = OperationKind::PlanUpsert;

    async fn find_applied(&self, op_id: &OperationId) -> Result<Option<u64>, Error> {
        let plan = self
            .plans
            .find_by_operation(op_id)
            .await
            .map_err(Error::storage)?;
        Ok(plan.map(|plan| plan.id.get()))
    }

    async fn apply(&self, draft: PlanDraft, op_id: Option<OperationId>) -> Result<Plan, Error> {
        let target = self
            .users
            .find_by_id(draft.user_id)
            .await
            .map_err(Error::storage)?;
        if target.is_none() {
            return Err(FieldError::new(
                "user_id",
                FieldErrorCode::InvalidValue,
                format!("user {} does not exist", draft.user_id),
            )
            .into());
        }
        let plan = self
            .plans
            .upsert(draft, op_id)
            .await
            .map_err(Error::storage)?;
        info!(
            plan_id = %plan.id,
            user_id = %plan.user_id,
            week_start = %plan.week_start,
            items = plan.items.len(),
            "plan saved"
        );
        Ok(plan)
    }

    fn result_id(plan: &Plan) -> u64 {
        plan.id.get()
    }
}
