//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, ServerSettings};
pub(crate) use state_builders::{Storage, build_http_state, open_storage};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use chrono::Duration;
use mockable::Clock;

use medrep::Trace;
#[cfg(debug_assertions)]
use medrep::doc::ApiDoc;
use medrep::inbound::http::health::HealthState;
use medrep::inbound::http::session::SessionPolicy;
use medrep::inbound::http::state::HttpState;
use medrep::inbound::http::{configure, not_found};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session_policy: web::Data<SessionPolicy>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
    session_ttl: Duration,
}

fn cookie_max_age(ttl: Duration) -> actix_web::cookie::time::Duration {
    actix_web::cookie::time::Duration::seconds(ttl.num_seconds())
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session_policy,
        key,
        cookie_secure,
        same_site,
        session_ttl,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Signed)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(cookie_max_age(session_ttl)))
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(session_policy)
        .wrap(session)
        .wrap(Trace)
        .configure(configure)
        .default_service(web::to(not_found));

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over `storage`.
///
/// # Parameters
/// - `health_state`: shared readiness state, marked ready once bound.
/// - `config`: session and binding settings.
/// - `storage`: opened data and uploads directories.
/// - `clock`: time source for services and session expiry.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    storage: &Storage,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(storage, clock.clone());
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        session_ttl,
        bind_addr,
    } = config;
    let session_policy = web::Data::new(SessionPolicy::new(clock, session_ttl));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session_policy: session_policy.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
            session_ttl,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
