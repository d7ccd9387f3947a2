//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only talk to domain
//! services, so they stay testable with in-memory or mocked ports.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ImageStore, LiveFeed, OperationLog, PasswordHasher, PlanRepository, ProductRepository,
    UserRepository, VisitRepository,
};
use crate::domain::{
    AccountService, CatalogueService, IdempotentWriter, PlanService, ReportService, VisitService,
    VisitServiceDeps,
};

/// Parameter object bundling every port the HTTP adapter depends on.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub products: Arc<dyn ProductRepository>,
    pub images: Arc<dyn ImageStore>,
    pub plans: Arc<dyn PlanRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub operations: Arc<dyn OperationLog>,
    pub live: Arc<dyn LiveFeed>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub catalogue: CatalogueService,
    pub plans: PlanService,
    pub visits: VisitService,
    pub reports: ReportService,
    pub live: Arc<dyn LiveFeed>,
}

impl HttpState {
    /// Wire the domain services onto `ports`.
    ///
    /// Plan upserts and visit creation share one [`IdempotentWriter`] so a
    /// single gate orders every tagged write.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            users,
            hasher,
            products,
            images,
            plans,
            visits,
            operations,
            live,
            clock,
        } = ports;
        let writer = Arc::new(IdempotentWriter::new(operations, clock.clone()));
        Self {
            accounts: AccountService::new(users.clone(), hasher, clock.clone()),
            catalogue: CatalogueService::new(products.clone(), images),
            plans: PlanService::new(plans, users.clone(), writer.clone()),
            visits: VisitService::new(VisitServiceDeps {
                visits: visits.clone(),
                users,
                products: products.clone(),
                writer,
                feed: live.clone(),
                clock,
            }),
            reports: ReportService::new(visits, products),
            live,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
