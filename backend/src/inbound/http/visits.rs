//! Visit logging handlers.
//!
//! ```text
//! POST /api/visits {"op_id":"…","date":"2024-04-02","doctor":"Dr. Ahmadi","product_id":3,"note":"left samples"}
//! GET  /api/my/visits
//! GET  /api/my-visits
//! ```

use actix_web::{HttpRequest, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, ProductId, Visit, VisitDraft, VisitId, VisitParts, VisitReceipt};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{LenientJson, LooseId, resolve_id};
use crate::inbound::http::idempotency::tag_request;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Visit body. Offline clients send `ts`/`target`/`product` and attach
/// `op_id` and `client_ts`; the form sends `date`/`doctor`/`product_id`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct VisitRequest {
    #[schema(example = "2024-04-02")]
    pub date: Option<String>,
    /// RFC 3339 timestamp; its UTC date is used when `date` is absent.
    pub ts: Option<String>,
    pub doctor: Option<String>,
    /// Alias of `doctor`.
    pub target: Option<String>,
    #[schema(value_type = Option<u64>)]
    pub product_id: Option<LooseId>,
    /// Alias of `product_id`.
    #[schema(value_type = Option<u64>)]
    pub product: Option<LooseId>,
    pub note: Option<String>,
    /// When the client recorded the visit, RFC 3339.
    pub client_ts: Option<String>,
}

/// Acknowledgement of a visit; `replayed` marks a repeated `op_id`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitAck {
    pub id: VisitId,
    pub replayed: bool,
}

impl From<VisitReceipt> for VisitAck {
    fn from(receipt: VisitReceipt) -> Self {
        Self {
            id: receipt.id,
            replayed: receipt.replayed,
        }
    }
}

fn first_text<'a>(candidates: [Option<&'a str>; 2]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

fn visit_draft(body: &VisitRequest) -> Result<VisitDraft, Error> {
    let product_id = resolve_id("product_id", [body.product_id.as_ref(), body.product.as_ref()])?
        .map(ProductId::new);
    Ok(VisitDraft::try_from_parts(VisitParts {
        date: body.date.as_deref(),
        ts: body.ts.as_deref(),
        doctor: first_text([body.doctor.as_deref(), body.target.as_deref()]),
        product_id,
        note: body.note.as_deref(),
        client_ts: body.client_ts.as_deref(),
    })?)
}

/// Log a visit for the signed-in user.
///
/// Newly stored visits are pushed to the live feed; replays are not.
#[utoipa::path(
    post,
    path = "/api/visits",
    request_body = VisitRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header,
            description = "Operation id used when the body carries no `op_id`")
    ),
    responses(
        (status = 200, description = "Visit stored or replayed", body = VisitAck),
        (status = 400, description = "Invalid visit", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Data store unavailable", body = Error)
    ),
    tags = ["visits"],
    operation_id = "createVisit"
)]
#[post("/visits")]
pub async fn create_visit(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: LenientJson<VisitRequest>,
) -> ApiResult<web::Json<VisitAck>> {
    let claims = session.require_claims()?;
    let tagged = tag_request(request.headers(), &payload.raw)?;
    let draft = visit_draft(&payload.body)?;
    let receipt = state
        .visits
        .create(&claims, tagged.op_id, tagged.payload_hash, draft)
        .await?;
    Ok(web::Json(receipt.into()))
}

async fn caller_visits(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<web::Json<Vec<Visit>>> {
    let claims = session.require_claims()?;
    Ok(web::Json(state.visits.my_visits(&claims).await?))
}

/// The caller's visits, newest day first.
#[utoipa::path(
    get,
    path = "/api/my/visits",
    responses(
        (status = 200, description = "Visits", body = [Visit]),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["visits"],
    operation_id = "myVisits"
)]
#[get("/my/visits")]
pub async fn my_visits(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Visit>>> {
    caller_visits(&state, &session).await
}

/// Alias of `/api/my/visits`.
#[utoipa::path(
    get,
    path = "/api/my-visits",
    responses(
        (status = 200, description = "Visits", body = [Visit]),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["visits"],
    operation_id = "myVisitsAlias"
)]
#[get("/my-visits")]
pub async fn my_visits_alias(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Visit>>> {
    caller_visits(&state, &session).await
}
