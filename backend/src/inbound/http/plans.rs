//! Weekly plan handlers.
//!
//! ```text
//! POST /api/plans {"op_id":"…","user_id":2,"week_start":"2024-03-30","items":[{"day_index":0,"doctor":"Dr. Ahmadi"}]}
//! GET  /api/plan?user_id=2&week_start=2024-03-30
//! GET  /api/plans?user_id=2
//! GET  /api/my/plan?week_start=2024-03-30
//! ```

use actix_web::{HttpRequest, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, Plan, PlanDraft, PlanId, PlanItemParts, PlanReceipt, ProductId, UserId, WeekStart,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{LenientJson, LooseId, resolve_id};
use crate::inbound::http::idempotency::tag_request;
use crate::inbound::http::products::required_query_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// One scheduled visit inside a plan.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PlanItemRequest {
    /// 0 (Saturday) through 6.
    pub day_index: Option<i64>,
    pub doctor: Option<String>,
    pub details: Option<String>,
    #[schema(value_type = Option<u64>)]
    pub product_id: Option<LooseId>,
    /// Alias of `product_id`.
    #[schema(value_type = Option<u64>)]
    pub product: Option<LooseId>,
}

/// Plan upsert body. `op_id` may also arrive in the `Idempotency-Key` header.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PlanRequest {
    #[schema(value_type = Option<u64>)]
    pub user_id: Option<LooseId>,
    #[schema(example = "2024-03-30")]
    pub week_start: Option<String>,
    #[serde(default)]
    pub items: Vec<PlanItemRequest>,
}

/// Acknowledgement of a plan upsert; `replayed` marks a repeated `op_id`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanAck {
    pub id: PlanId,
    #[schema(value_type = String, example = "2024-03-30")]
    pub week_start: WeekStart,
    pub replayed: bool,
}

impl From<PlanReceipt> for PlanAck {
    fn from(receipt: PlanReceipt) -> Self {
        Self {
            id: receipt.id,
            week_start: receipt.week_start,
            replayed: receipt.replayed,
        }
    }
}

/// `?user_id=&week_start=` selector.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PlanSelector {
    pub user_id: Option<String>,
    pub week_start: Option<String>,
}

/// `?user_id=` selector.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserSelector {
    pub user_id: Option<String>,
}

/// `?week_start=` selector.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WeekSelector {
    pub week_start: Option<String>,
}

fn plan_draft(body: &PlanRequest) -> Result<PlanDraft, Error> {
    let user_id = resolve_id("user_id", [body.user_id.as_ref()])?.map(UserId::new);
    let product_ids = body
        .items
        .iter()
        .map(|item| {
            resolve_id("product_id", [item.product_id.as_ref(), item.product.as_ref()])
                .map(|id| id.map(ProductId::new))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let items = body
        .items
        .iter()
        .zip(product_ids)
        .map(|(item, product_id)| PlanItemParts {
            day_index: item.day_index,
            doctor: item.doctor.as_deref(),
            details: item.details.as_deref(),
            product_id,
        });
    Ok(PlanDraft::try_from_parts(
        user_id,
        body.week_start.as_deref(),
        items,
    )?)
}

/// Create or replace the plan for a user and week.
///
/// A plan for the same `(user_id, week_start)` is replaced in place and
/// keeps its id.
#[utoipa::path(
    post,
    path = "/api/plans",
    request_body = PlanRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header,
            description = "Operation id used when the body carries no `op_id`")
    ),
    responses(
        (status = 200, description = "Plan stored or replayed", body = PlanAck),
        (status = 400, description = "Invalid plan", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 503, description = "Data store unavailable", body = Error)
    ),
    tags = ["plans"],
    operation_id = "upsertPlan"
)]
#[post("/plans")]
pub async fn upsert_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: LenientJson<PlanRequest>,
) -> ApiResult<web::Json<PlanAck>> {
    let claims = session.require_admin()?;
    let tagged = tag_request(request.headers(), &payload.raw)?;
    let draft = plan_draft(&payload.body)?;
    let receipt = state
        .plans
        .upsert(&claims, tagged.op_id, tagged.payload_hash, draft)
        .await?;
    Ok(web::Json(receipt.into()))
}

/// A user's plan for one week, or `null`.
#[utoipa::path(
    get,
    path = "/api/plan",
    params(PlanSelector),
    responses(
        (status = 200, description = "Plan or null", body = Option<Plan>),
        (status = 400, description = "Missing selector", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["plans"],
    operation_id = "getPlan"
)]
#[get("/plan")]
pub async fn get_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PlanSelector>,
) -> ApiResult<web::Json<Option<Plan>>> {
    let claims = session.require_claims()?;
    let user_id = UserId::new(required_query_id(query.user_id.as_deref(), "user_id")?);
    let week_start = WeekStart::parse(query.week_start.as_deref())?;
    Ok(web::Json(
        state.plans.plan_for(&claims, user_id, week_start).await?,
    ))
}

/// Every plan of one user.
#[utoipa::path(
    get,
    path = "/api/plans",
    params(UserSelector),
    responses(
        (status = 200, description = "Plans", body = [Plan]),
        (status = 400, description = "Missing user_id", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["plans"],
    operation_id = "listPlans"
)]
#[get("/plans")]
pub async fn list_plans(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<UserSelector>,
) -> ApiResult<web::Json<Vec<Plan>>> {
    let claims = session.require_claims()?;
    let user_id = UserId::new(required_query_id(query.user_id.as_deref(), "user_id")?);
    Ok(web::Json(state.plans.plans_for(&claims, user_id).await?))
}

/// The caller's plan for one week, or `null`.
#[utoipa::path(
    get,
    path = "/api/my/plan",
    params(WeekSelector),
    responses(
        (status = 200, description = "Plan or null", body = Option<Plan>),
        (status = 400, description = "Invalid week_start", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["plans"],
    operation_id = "myPlan"
)]
#[get("/my/plan")]
pub async fn my_plan(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<WeekSelector>,
) -> ApiResult<web::Json<Option<Plan>>> {
    let claims = session.require_claims()?;
    let week_start = WeekStart::parse(query.week_start.as_deref())?;
    Ok(web::Json(state.plans.my_plan(&claims, week_start).await?))
}
