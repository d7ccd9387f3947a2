//! Visit reports for administrators and for the signed-in user.

use std::sync::Arc;

use super::ports::{ProductRepository, VisitRepository};
use super::report::{overview, tally_by_product};
use super::{DateRange, Error, Overview, ProductTally, Role, SessionClaims};

/// Aggregates visits into reports.
#[derive(Clone)]
pub struct ReportService {
    visits: Arc<dyn VisitRepository>,
    products: Arc<dyn ProductRepository>,
}

impl ReportService {
    /// Create the service.
    pub fn new(visits: Arc<dyn VisitRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { visits, products }
    }

    /// Totals across every user.
    pub async fn overview(
        &self,
        caller: &SessionClaims,
        range: DateRange,
    ) -> Result<Overview, Error> {
        caller.require_role(Role::Admin)?;
        let visits = self.visits.list().await.map_err(Error::storage)?;
        Ok(overview(&visits, range))
    }

    /// Visit counts grouped by product across every user.
    pub async fn by_product(
        &self,
        caller: &SessionClaims,
        range: DateRange,
    ) -> Result<Vec<ProductTally>, Error> {
        caller.require_role(Role::Admin)?;
        let visits = self.visits.list().await.map_err(Error::storage)?;
        let products = self.products.list().await.map_err(Error::storage)?;
        Ok(tally_by_product(&visits, &products, range))
    }

    /// Totals for the caller's own visits.
    pub async fn my_overview(
        &self,
        caller: &SessionClaims,
        range: DateRange,
    ) -> Result<Overview, Error> {
        let visits = self
            .visits
            .list_for_user(caller.user_id)
            .await
            .map_err(Error::storage)?;
        Ok(overview(&visits, range))
    }
}
