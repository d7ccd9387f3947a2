//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The signed session cookie carries the caller's [`SessionClaims`]. Claims
//! that fail to decode or have outlived the configured lifetime resolve to
//! an anonymous caller and the claims are dropped. When the application holds
//! an [`HttpState`], the extractor re-reads the account on every request:
//! a deleted account signs the caller out and role edits apply at once.

use std::sync::Arc;

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use chrono::Duration;
use futures_util::future::LocalBoxFuture;
use mockable::{Clock, DefaultClock};
use tracing::{debug, warn};

use crate::domain::{AccountService, Error, Role, SessionClaims};

use super::session_config::DEFAULT_SESSION_TTL_HOURS;
use super::state::HttpState;

pub(crate) const CLAIMS_KEY: &str = "claims";

/// Lifetime policy applied when reading claims back from the cookie.
///
/// Registered as application data; requests without one fall back to the
/// system clock and the default lifetime.
#[derive(Clone)]
pub struct SessionPolicy {
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionPolicy {
    /// Policy reading time from `clock` and expiring claims after `ttl`.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { clock, ttl }
    }

    /// Configured claims lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new(
            Arc::new(DefaultClock),
            Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        )
    }
}

/// Request-scoped view of the caller's session.
#[derive(Clone)]
pub struct SessionContext {
    session: Session,
    policy: SessionPolicy,
}

impl SessionContext {
    /// Wrap an Actix session with a lifetime policy.
    pub fn new(session: Session, policy: SessionPolicy) -> Self {
        Self { session, policy }
    }

    /// Sign `claims` into the session cookie, rotating any previous session.
    pub fn persist_claims(&self, claims: &SessionClaims) -> Result<(), Error> {
        self.session.renew();
        self.session
            .insert(CLAIMS_KEY, claims)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Claims of the signed-in caller, or `None` for anonymous callers.
    pub fn claims(&self) -> Option<SessionClaims> {
        match self.session.get::<SessionClaims>(CLAIMS_KEY) {
            Ok(Some(claims)) if claims.is_expired(self.policy.clock.utc(), self.policy.ttl) => {
                debug!(user_id = %claims.user_id, "session expired");
                self.forget();
                None
            }
            Ok(claims) => claims,
            Err(error) => {
                warn!(%error, "undecodable session claims; treating caller as anonymous");
                self.forget();
                None
            }
        }
    }

    /// Require a signed-in caller or fail with `401 Unauthorized`.
    pub fn require_claims(&self) -> Result<SessionClaims, Error> {
        self.claims()
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require a signed-in administrator: `401` when anonymous, `403` for
    /// other roles.
    pub fn require_admin(&self) -> Result<SessionClaims, Error> {
        let claims = self.require_claims()?;
        claims.require_role(Role::Admin)?;
        Ok(claims)
    }

    /// Drop the session and expire its cookie.
    pub fn purge(&self) {
        self.session.purge();
    }

    /// Drop stale claims while leaving the session writable, so a login in
    /// the same request can still issue a cookie.
    fn forget(&self) {
        self.session.remove(CLAIMS_KEY);
    }

    /// Replace the cookie claims with the account as currently stored.
    async fn revalidate(&self, accounts: &AccountService) -> Result<(), Error> {
        let Some(claims) = self.claims() else {
            return Ok(());
        };
        match accounts.revalidate(&claims).await? {
            Some(current) if current == claims => Ok(()),
            Some(current) => {
                debug!(user_id = %current.user_id, role = %current.role, "session claims refreshed");
                self.session
                    .insert(CLAIMS_KEY, &current)
                    .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
            }
            None => {
                debug!(user_id = %claims.user_id, "session account no longer exists");
                self.forget();
                Ok(())
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let policy = req
            .app_data::<web::Data<SessionPolicy>>()
            .map(|policy| policy.get_ref().clone())
            .unwrap_or_default();
        let accounts = req
            .app_data::<web::Data<HttpState>>()
            .map(|state| state.accounts.clone());
        let fut = Session::from_request(req, payload);
        Box::pin(async move {
            let context = Self::new(fut.await?, policy);
            if let Some(accounts) = accounts {
                context
                    .revalidate(&accounts)
                    .await
                    .map_err(actix_web::Error::from)?;
            }
            Ok(context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::test_support::MutableClock;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use chrono::TimeDelta;

    fn claims(role: Role, clock: &MutableClock) -> SessionClaims {
        SessionClaims {
            user_id: UserId::new(3),
            username: "sara".into(),
            name: "Sara".into(),
            role,
            issued_at: clock.utc(),
        }
    }

    async fn set_claims(session: SessionContext, body: web::Json<SessionClaims>) -> Result<HttpResponse, Error> {
        session.persist_claims(&body)?;
        Ok(HttpResponse::NoContent().finish())
    }

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let claims = session.require_claims()?;
        Ok(HttpResponse::Ok().body(claims.user_id.to_string()))
    }

    async fn admin_only(session: SessionContext) -> Result<HttpResponse, Error> {
        session.require_admin()?;
        Ok(HttpResponse::NoContent().finish())
    }

    fn session_app(
        clock: Arc<MutableClock>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(test_session_middleware())
            .app_data(web::Data::new(SessionPolicy::new(clock, Duration::hours(12))))
            .route("/set", web::post().to(set_claims))
            .route("/whoami", web::get().to(whoami))
            .route("/admin", web::get().to(admin_only))
            .route(
                "/garbage",
                web::get().to(|session: Session| async move {
                    session
                        .insert(CLAIMS_KEY, "not claims")
                        .expect("insert garbage");
                    HttpResponse::NoContent()
                }),
            )
    }

    #[actix_web::test]
    async fn persisted_claims_resolve_to_the_same_user() {
        let clock = MutableClock::fixture();
        let app = test::init_service(session_app(clock.clone())).await;

        let set = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/set")
                .set_json(claims(Role::Rep, &clock))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&set);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "3");
    }

    #[actix_web::test]
    async fn missing_session_is_unauthorised() {
        let clock = MutableClock::fixture();
        let app = test::init_service(session_app(clock.clone())).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn expired_claims_are_anonymous() {
        let clock = MutableClock::fixture();
        let app = test::init_service(session_app(clock.clone())).await;
        let set = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/set")
                .set_json(claims(Role::Rep, &clock))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&set);

        clock.advance(TimeDelta::hours(12));
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn undecodable_claims_are_anonymous() {
        let clock = MutableClock::fixture();
        let app = test::init_service(session_app(clock.clone())).await;
        let set = test::call_service(&app, test::TestRequest::get().uri("/garbage").to_request()).await;
        let cookie = session_cookie(&set);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_admin_is_forbidden_from_admin_routes() {
        let clock = MutableClock::fixture();
        let app = test::init_service(session_app(clock.clone())).await;
        let set = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/set")
                .set_json(claims(Role::Advisor, &clock))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&set);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/admin").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
