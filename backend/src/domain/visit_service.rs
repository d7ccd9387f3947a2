//! Visit logging and the live feed notifications it triggers.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use super::idempotent_writer::{IdempotentWriter, OperationTarget, TaggedWrite, WriteOutcome};
use super::ports::{
    LiveEvent, LiveFeed, ProductRepository, UserRepository, VisitNotice, VisitRepository,
};
use super::visit::sort_newest_first;
use super::{
    Error, OperationId, OperationKind, PayloadHash, SessionClaims, UserId, Visit, VisitDraft,
    VisitId,
};

/// Acknowledgement of a visit submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitReceipt {
    /// Visit identifier.
    pub id: VisitId,
    /// Whether the operation id had already been applied.
    pub replayed: bool,
}

/// Records visits and announces new ones.
#[derive(Clone)]
pub struct VisitService {
    visits: Arc<dyn VisitRepository>,
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    writer: Arc<IdempotentWriter>,
    feed: Arc<dyn LiveFeed>,
    clock: Arc<dyn Clock>,
}

/// Collaborators of [`VisitService`].
pub struct VisitServiceDeps {
    /// Visit storage.
    pub visits: Arc<dyn VisitRepository>,
    /// Account lookups for live feed names.
    pub users: Arc<dyn UserRepository>,
    /// Product lookups for live feed labels.
    pub products: Arc<dyn ProductRepository>,
    /// Shared idempotent writer.
    pub writer: Arc<IdempotentWriter>,
    /// Live feed.
    pub feed: Arc<dyn LiveFeed>,
    /// Time source for `created_at`.
    pub clock: Arc<dyn Clock>,
}

impl VisitService {
    /// Create the service.
    pub fn new(deps: VisitServiceDeps) -> Self {
        let VisitServiceDeps {
            visits,
            users,
            products,
            writer,
            feed,
            clock,
        } = deps;
        Self {
            visits,
            users,
            products,
            writer,
            feed,
            clock,
        }
    }

    /// Log a visit for the caller.
    ///
    /// Only newly applied visits reach the live feed; replays are silent.
    pub async fn create(
        &self,
        caller: &SessionClaims,
        op_id: Option<OperationId>,
        payload_hash: PayloadHash,
        draft: VisitDraft,
    ) -> Result<VisitReceipt, Error> {
        let outcome = self
            .writer
            .execute(
                self,
                TaggedWrite {
                    user_id: caller.user_id,
                    op_id,
                    payload_hash,
                    input: (caller.user_id, draft),
                },
            )
            .await?;
        match outcome {
            WriteOutcome::Applied(visit) => {
                self.announce(&visit).await;
                Ok(VisitReceipt {
                    id: visit.id,
                    replayed: false,
                })
            }
            WriteOutcome::Replayed { result_id } => Ok(VisitReceipt {
                id: VisitId::new(result_id),
                replayed: true,
            }),
        }
    }

    /// The caller's visits, newest day first.
    pub async fn my_visits(&self, caller: &SessionClaims) -> Result<Vec<Visit>, Error> {
        let mut visits = self
            .visits
            .list_for_user(caller.user_id)
            .await
            .map_err(Error::storage)?;
        sort_newest_first(&mut visits);
        Ok(visits)
    }

    async fn announce(&self, visit: &Visit) {
        let user_name = match self.users.find_by_id(visit.user_id).await {
            Ok(account) => account.map(|account| account.user.name.as_str().to_owned()),
            Err(err) => {
                warn!(error = %err, "live feed: author lookup failed");
                None
            }
        };
        let product_name = match visit.product_id {
            None => None,
            Some(product_id) => match self.products.list().await {
                Ok(products) => products
                    .iter()
                    .find(|product| product.id == product_id)
                    .map(super::Product::label),
                Err(err) => {
                    warn!(error = %err, "live feed: product lookup failed");
                    None
                }
            },
        };
        self.feed.publish(LiveEvent::Visit(VisitNotice {
            user_name,
            date: visit.date.format("%Y-%m-%d").to_string(),
            doctor: visit.doctor.clone(),
            product_name,
        }));
    }
}

#[async_trait]
impl OperationTarget for VisitService {
    type Input = (UserId, VisitDraft);
    type Output = Visit;

    const KIND: OperationKind = OperationKind::VisitCreate;

    async fn find_applied(&self, op_id: &OperationId) -> Result<Option<u64>, Error> {
        let visit = self
            .visits
            .find_by_operation(op_id)
            .await
            .map_err(Error::storage)?;
        Ok(visit.map(|visit| visit.id.get()))
    }

    async fn apply(
        &self,
        input: (UserId, VisitDraft),
        op_id: Option<OperationId>,
    ) -> Result<Visit, Error> {
        let (user_id, draft) = input;
        let visit = self
            .visits
            .append(user_id, draft, op_id, self.clock.utc())
            .await
            .map_err(Error::storage)?;
        info!(visit_id = %visit.id, user_id = %user_id, date = %visit.date, "visit logged");
        Ok(visit)
    }

    fn result_id(visit: &Visit) -> u64 {
        visit.id.get()
    }
}

#[cfg(test)]
#[path = "visit_service_tests.rs"]
mod tests;
