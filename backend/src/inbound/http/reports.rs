//! Visit report handlers.
//!
//! `from` and `to` are inclusive `YYYY-MM-DD` dates; either may be omitted.
//!
//! ```text
//! GET /api/reports/overview?from=2024-04-01&to=2024-04-30
//! GET /api/reports/by-product?from=2024-04-01
//! GET /api/my/overview
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{DateRange, Error, Overview, ProductTally};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Inclusive date range filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RangeQuery {
    /// First day, default `0000-01-01`.
    pub from: Option<String>,
    /// Last day, default `9999-12-31`.
    pub to: Option<String>,
}

impl RangeQuery {
    fn range(&self) -> Result<DateRange, Error> {
        Ok(DateRange::parse(self.from.as_deref(), self.to.as_deref())?)
    }
}

/// Visit total and distinct targets across every user.
#[utoipa::path(
    get,
    path = "/api/reports/overview",
    params(RangeQuery),
    responses(
        (status = 200, description = "Totals", body = Overview),
        (status = 400, description = "Invalid range", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["reports"],
    operation_id = "reportOverview"
)]
#[get("/reports/overview")]
pub async fn overview(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Overview>> {
    let claims = session.require_claims()?;
    let range = query.range()?;
    Ok(web::Json(state.reports.overview(&claims, range).await?))
}

/// Visit counts per product, most visited first.
#[utoipa::path(
    get,
    path = "/api/reports/by-product",
    params(RangeQuery),
    responses(
        (status = 200, description = "Counts per product", body = [ProductTally]),
        (status = 400, description = "Invalid range", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["reports"],
    operation_id = "reportByProduct"
)]
#[get("/reports/by-product")]
pub async fn by_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Vec<ProductTally>>> {
    let claims = session.require_claims()?;
    let range = query.range()?;
    Ok(web::Json(state.reports.by_product(&claims, range).await?))
}

/// Totals for the caller's own visits.
#[utoipa::path(
    get,
    path = "/api/my/overview",
    params(RangeQuery),
    responses(
        (status = 200, description = "Totals", body = Overview),
        (status = 400, description = "Invalid range", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["reports"],
    operation_id = "myOverview"
)]
#[get("/my/overview")]
pub async fn my_overview(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<Overview>> {
    let claims = session.require_claims()?;
    let range = query.range()?;
    Ok(web::Json(state.reports.my_overview(&claims, range).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::Role;
    use crate::inbound::http::test_utils::{StoreFixture, api_app, json_body, login};

    async fn post<S>(app: &S, cookie: &Cookie<'static>, uri: &str, body: Value) -> Value
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri(uri)
                .cookie(cookie.clone())
                .set_json(body)
                .to_request(),
        )
        .await;
        assert!(res.status().is_success(), "POST {uri} failed: {}", res.status());
        json_body(res).await
    }

    async fn get<S>(app: &S, cookie: &Cookie<'static>, uri: &str) -> (StatusCode, Value)
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::get().uri(uri).cookie(cookie.clone()).to_request(),
        )
        .await;
        (res.status(), json_body(res).await)
    }

    #[rstest]
    #[actix_web::test]
    async fn reports_count_inclusive_ranges() {
        let store = StoreFixture::new();
        store.seed_user("admin", Role::Admin, "admin").await;
        store.seed_user("sara", Role::Rep, "pw").await;
        store.seed_user("nima", Role::Advisor, "pw").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let admin = login(&app, "admin", "admin").await;
        let cardiol = post(&app, &admin, "/api/products", json!({"brand": "Acme", "name": "Cardiol"})).await;
        let zinc = post(&app, &admin, "/api/products", json!({"brand": "Bex", "name": "Zinc"})).await;

        let sara = login(&app, "sara", "pw").await;
        let nima = login(&app, "nima", "pw").await;
        for (cookie, date, doctor, product) in [
            (&sara, "2024-04-01", "Dr. A", cardiol["id"].clone()),
            (&sara, "2024-04-02", "Dr. A", cardiol["id"].clone()),
            (&sara, "2024-04-03", "Dr. B", zinc["id"].clone()),
            (&nima, "2024-04-03", "Pharmacy C", Value::Null),
            (&nima, "2024-05-01", "Pharmacy C", cardiol["id"].clone()),
        ] {
            post(
                &app,
                cookie,
                "/api/visits",
                json!({"date": date, "doctor": doctor, "product_id": product}),
            )
            .await;
        }

        let (status, all) = get(&app, &admin, "/api/reports/overview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all, json!({"total": 5, "unique": 3}));

        let (_, april) = get(&app, &admin, "/api/reports/overview?from=2024-04-01&to=2024-04-03").await;
        assert_eq!(april, json!({"total": 4, "unique": 3}));

        let (_, tally) = get(&app, &admin, "/api/reports/by-product?from=2024-04-01&to=2024-04-30").await;
        assert_eq!(
            tally,
            json!([
                {"brand": "Acme", "product": "Cardiol", "count": 2},
                {"brand": "", "product": "—", "count": 1},
                {"brand": "Bex", "product": "Zinc", "count": 1},
            ])
        );

        let (_, mine) = get(&app, &sara, "/api/my/overview?to=2024-04-02").await;
        assert_eq!(mine, json!({"total": 2, "unique": 1}));
    }

    #[rstest]
    #[case("/api/reports/overview?from=2024-13-01", "from", "invalid_date")]
    #[case("/api/reports/overview?to=tomorrow", "to", "invalid_date")]
    #[case("/api/reports/by-product?from=2024-05-01&to=2024-04-01", "from", "invalid_value")]
    #[actix_web::test]
    async fn malformed_ranges_are_rejected(
        #[case] uri: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let store = StoreFixture::new();
        store.seed_user("admin", Role::Admin, "admin").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let admin = login(&app, "admin", "admin").await;

        let (status, body) = get(&app, &admin, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[case("/api/reports/overview")]
    #[case("/api/reports/by-product")]
    #[actix_web::test]
    async fn company_reports_are_admin_only(#[case] uri: &str) {
        let store = StoreFixture::new();
        store.seed_user("sara", Role::Rep, "pw").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let sara = login(&app, "sara", "pw").await;

        let (status, _) = get(&app, &sara, uri).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
