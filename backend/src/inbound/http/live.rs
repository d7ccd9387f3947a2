//! Server-sent event stream of new visits for administrators.
//!
//! ```text
//! GET /sse
//!
//! data: {"type":"visit","payload":{"user_name":"Sara","date":"2024-04-02","doctor":"Dr. Ahmadi","product_name":"Acme — Cardiol"}}
//! ```

use std::convert::Infallible;

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{HttpResponse, get, web};
use futures_util::{StreamExt as _, future, stream};
use tracing::{debug, warn};

use crate::domain::Error;
use crate::domain::ports::LiveEvent;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Encode one event as an SSE `data:` frame.
fn frame(event: &LiveEvent) -> Option<Bytes> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Bytes::from(format!("data: {json}\n\n"))),
        Err(err) => {
            warn!(error = %err, "dropping live event that failed to serialise");
            None
        }
    }
}

/// Stream new visits as they are stored.
///
/// The stream opens with a blank line so proxies flush headers at once.
/// Disconnecting drops the subscription.
#[utoipa::path(
    get,
    path = "/sse",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = LiveEvent),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["live"],
    operation_id = "liveEvents"
)]
#[get("/sse")]
pub async fn events(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<HttpResponse> {
    let claims = session.require_admin()?;
    debug!(user_id = %claims.user_id, "live feed subscriber connected");
    let preamble = stream::once(future::ready(Bytes::from_static(b"\n")));
    let frames = state
        .live
        .subscribe()
        .filter_map(|event| future::ready(frame(&event)));
    let body = preamble
        .chain(frames)
        .map(Ok::<Bytes, Infallible>);
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONNECTION, "keep-alive"))
        .streaming(body))
}
