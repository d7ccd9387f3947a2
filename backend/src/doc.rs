//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP handler, the request and response bodies
//! they exchange and the session cookie security scheme. Swagger UI serves
//! the generated document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{LiveEvent, VisitNotice};
use crate::domain::{
    Error, ErrorCode, Overview, Plan, PlanItem, Product, ProductTally, Role, User, Visit,
};
use crate::inbound::http::health::ProbeStatus;
use crate::inbound::http::plans::{PlanAck, PlanItemRequest, PlanRequest};
use crate::inbound::http::products::ProductRequest;
use crate::inbound::http::uploads::{UploadRequest, UploadedImage};
use crate::inbound::http::users::{
    CreatedUser, LoginRequest, RegisterRequest, SessionUser, UserEnvelope, UserPatchRequest,
};
use crate::inbound::http::visits::{VisitAck, VisitRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session cookie issued by POST /api/login.",
            ))),
        );
    }
}

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Medrep API",
        description = "Visit logging, weekly plans and reports for medical representatives."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::me,
        crate::inbound::http::users::register,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::upsert_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::uploads::upload_image,
        crate::inbound::http::uploads::serve_upload,
        crate::inbound::http::plans::upsert_plan,
        crate::inbound::http::plans::get_plan,
        crate::inbound::http::plans::list_plans,
        crate::inbound::http::plans::my_plan,
        crate::inbound::http::visits::create_visit,
        crate::inbound::http::visits::my_visits,
        crate::inbound::http::visits::my_visits_alias,
        crate::inbound::http::reports::overview,
        crate::inbound::http::reports::by_product,
        crate::inbound::http::reports::my_overview,
        crate::inbound::http::live::events,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        SessionUser,
        UserEnvelope,
        CreatedUser,
        LoginRequest,
        RegisterRequest,
        UserPatchRequest,
        Product,
        ProductRequest,
        UploadRequest,
        UploadedImage,
        Plan,
        PlanItem,
        PlanRequest,
        PlanItemRequest,
        PlanAck,
        Visit,
        VisitRequest,
        VisitAck,
        Overview,
        ProductTally,
        LiveEvent,
        VisitNotice,
        ProbeStatus,
    )),
    tags(
        (name = "session", description = "Sign-in, sign-out and registration"),
        (name = "users", description = "Account administration"),
        (name = "products", description = "Product catalogue and images"),
        (name = "plans", description = "Weekly visit plans"),
        (name = "visits", description = "Visit logging"),
        (name = "reports", description = "Visit totals"),
        (name = "live", description = "Server-sent visit feed"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
