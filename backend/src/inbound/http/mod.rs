//! HTTP inbound adapter exposing the JSON API, uploads and the live feed.
//!
//! Routes are registered through [`configure`]; the binary wraps them with
//! session and tracing middleware.

pub mod body;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod live;
pub mod plans;
pub mod products;
pub mod reports;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;
pub mod visits;

use actix_web::{HttpRequest, web};

use crate::domain::Error;

pub use error::ApiResult;

/// Register every route outside `/api` plus the `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::ready)
        .service(health::live)
        .service(live::events)
        .service(uploads::serve_upload)
        .service(web::scope("/api").configure(configure_api));
}

/// Register the `/api` routes on a scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(uploads::UPLOAD_BODY_LIMIT))
        .service(users::login)
        .service(users::logout)
        .service(users::me)
        .service(users::register)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(products::list_products)
        .service(products::upsert_product)
        .service(products::delete_product)
        .service(uploads::upload_image)
        .service(plans::upsert_plan)
        .service(plans::get_plan)
        .service(plans::list_plans)
        .service(plans::my_plan)
        .service(visits::create_visit)
        .service(visits::my_visits)
        .service(visits::my_visits_alias)
        .service(reports::overview)
        .service(reports::by_product)
        .service(reports::my_overview);
}

/// Fallback for unmatched routes: a JSON `404`.
pub async fn not_found(req: HttpRequest) -> ApiResult<actix_web::HttpResponse> {
    Err(Error::not_found(format!("no route for {} {}", req.method(), req.path())))
}
