//! `plans.json` adapter for [`PlanRepository`].

use async_trait::async_trait;

use crate::domain::ports::{PlanRepository, PlanRepositoryError};
use crate::domain::{OperationId, Plan, PlanDraft, PlanId, UserId, WeekStart, next_id};

use super::json_collection::{Change, JsonCollection};

/// Plans stored in `plans.json`.
pub struct JsonPlanRepository {
    rows: JsonCollection<Plan>,
}

impl JsonPlanRepository {
    /// Repository over `rows`.
    pub fn new(rows: JsonCollection<Plan>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl PlanRepository for JsonPlanRepository {
    async fn find(
        &self,
        user_id: UserId,
        week_start: WeekStart,
    ) -> Result<Option<Plan>, PlanRepositoryError> {
        Ok(self
            .rows
            .load()
            .await
            .into_iter()
            .find(|plan| plan.occupies(user_id, week_start)))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Plan>, PlanRepositoryError> {
        let mut plans: Vec<Plan> = self
            .rows
            .load()
            .await
            .into_iter()
            .filter(|plan| plan.user_id == user_id)
            .collect();
        plans.sort_by_key(|plan| plan.week_start);
        Ok(plans)
    }

    async fn find_by_operation(
        &self,
        op_id: &OperationId,
    ) -> Result<Option<Plan>, PlanRepositoryError> {
        Ok(self
            .rows
            .load()
            .await
            .into_iter()
            .find(|plan| plan.was_written_by(op_id)))
    }

    async fn upsert(
        &self,
        draft: PlanDraft,
        op_id: Option<OperationId>,
    ) -> Result<Plan, PlanRepositoryError> {
        self.rows
            .update(|plans| {
                let PlanDraft {
                    user_id,
                    week_start,
                    items,
                } = draft;
                if let Some(existing) = plans
                    .iter_mut()
                    .find(|plan| plan.occupies(user_id, week_start))
                {
                    existing.items = items;
                    existing.stamp(op_id);
                    return Change::Write(existing.clone());
                }
                let mut plan = Plan {
                    id: PlanId::new(next_id(plans)),
                    user_id,
                    week_start,
                    items,
                    op_id: None,
                    op_ids: Vec::new(),
                };
                plan.stamp(op_id);
                plans.push(plan.clone());
                Change::Write(plan)
            })
            .await
            .map_err(|err| PlanRepositoryError::storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanItemParts;
    use crate::outbound::persistence::test_support::scratch_dir;
    use rstest::rstest;

    fn draft(user: u64, week: &str, doctor: &str) -> PlanDraft {
        PlanDraft::try_from_parts(
            Some(UserId::new(user)),
            Some(week),
            [PlanItemParts {
                day_index: Some(0),
                doctor: Some(doctor),
                ..PlanItemParts::default()
            }],
        )
        .expect("draft")
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_replaces_the_same_week_in_place() {
        let (_tmp, dir) = scratch_dir();
        let repo = JsonPlanRepository::new(JsonCollection::new(dir, "plans.json"));

        let first = repo.upsert(draft(2, "2024-03-30", "Dr. A"), None).await.expect("first");
        let second = repo
            .upsert(
                draft(2, "2024-03-30", "Dr. B"),
                Some(OperationId::new("op-2").expect("op")),
            )
            .await
            .expect("second");
        let other_week = repo.upsert(draft(2, "2024-04-06", "Dr. C"), None).await.expect("third");

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other_week.id);
        let plans = repo.list_for_user(UserId::new(2)).await.expect("list");
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].items[0].doctor, "Dr. B");
        assert_eq!(plans[0].op_id.as_ref().map(OperationId::as_str), Some("op-2"));
    }

    #[rstest]
    #[tokio::test]
    async fn earlier_operations_still_find_a_rewritten_plan() {
        let (_tmp, dir) = scratch_dir();
        let repo = JsonPlanRepository::new(JsonCollection::new(dir, "plans.json"));
        let first_op = OperationId::new("op-a").expect("op");
        let second_op = OperationId::new("op-b").expect("op");

        let first = repo
            .upsert(draft(2, "2024-03-30", "Dr. Old"), Some(first_op.clone()))
            .await
            .expect("first");
        repo.upsert(draft(2, "2024-03-30", "Dr. New"), Some(second_op.clone()))
            .await
            .expect("second");
        repo.upsert(draft(2, "2024-03-30", "Dr. Newer"), None)
            .await
            .expect("untagged");

        let by_first = repo.find_by_operation(&first_op).await.expect("by first");
        let by_second = repo.find_by_operation(&second_op).await.expect("by second");
        assert_eq!(by_first.as_ref().map(|plan| plan.id), Some(first.id));
        assert_eq!(by_second.as_ref().map(|plan| plan.id), Some(first.id));
        let stored = by_first.expect("stored plan");
        assert_eq!(stored.op_ids, vec![first_op, second_op]);
        assert_eq!(stored.items[0].doctor, "Dr. Newer");
    }

    #[rstest]
    #[tokio::test]
    async fn finds_plans_by_stamp_and_slot() {
        let (_tmp, dir) = scratch_dir();
        let repo = JsonPlanRepository::new(JsonCollection::new(dir, "plans.json"));
        let op_id = OperationId::new("op-1").expect("op");
        let stored = repo
            .upsert(draft(3, "2024-03-30", "Dr. A"), Some(op_id.clone()))
            .await
            .expect("upsert");

        let by_op = repo.find_by_operation(&op_id).await.expect("by op");
        let by_slot = repo
            .find(UserId::new(3), WeekStart::parse(Some("2024-03-30")).expect("week"))
            .await
            .expect("by slot");
        let other_user = repo
            .find(UserId::new(4), WeekStart::parse(Some("2024-03-30")).expect("week"))
            .await
            .expect("other user");

        assert_eq!(by_op, Some(stored.clone()));
        assert_eq!(by_slot, Some(stored));
        assert!(other_user.is_none());
    }
}
