//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use chrono::Duration;
use serde_json::{Value, json};

use crate::domain::ports::PasswordHasher;
use crate::domain::{NewUser, Role, UserId};
use crate::outbound::live::BroadcastLiveFeed;
use crate::outbound::persistence::DataStore;
use crate::outbound::security::Argon2PasswordHasher;
use crate::outbound::uploads::DirImageStore;
use crate::test_support::MutableClock;

use super::health::HealthState;
use super::session::SessionPolicy;
use super::state::{HttpState, HttpStatePorts};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing key per invocation.
/// - Names the cookie `session` and disables the `Secure` flag for local
///   HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Parse a JSON response body.
pub async fn json_body(res: ServiceResponse) -> Value {
    let body = test::read_body(res).await;
    serde_json::from_slice(&body).expect("JSON response body")
}

/// Full route table over `fixture`, with sessions expiring after 12 hours
/// of fixture time.
pub fn api_app(
    fixture: &StoreFixture,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(fixture.state.clone()))
        .app_data(web::Data::new(SessionPolicy::new(
            fixture.clock.clone(),
            Duration::hours(12),
        )))
        .app_data(web::Data::new(HealthState::new()))
        .configure(super::configure)
        .default_service(web::to(super::not_found))
}

/// Sign in through `POST /api/login` and return the session cookie.
pub async fn login<S>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login as {username} failed: {}", res.status());
    session_cookie(&res)
}

/// HTTP state over a scratch data directory with real adapters.
pub struct StoreFixture {
    pub state: HttpState,
    pub store: DataStore,
    pub live: Arc<BroadcastLiveFeed>,
    pub clock: Arc<MutableClock>,
    _dir: tempfile::TempDir,
}

impl StoreFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("scratch dir");
        let root = camino::Utf8Path::from_path(dir.path()).expect("utf-8 scratch path");
        let store = DataStore::open(root).expect("open data store");
        let clock = MutableClock::fixture();
        let images =
            DirImageStore::open(&root.join("uploads"), clock.clone()).expect("open uploads");
        let live = Arc::new(BroadcastLiveFeed::default());
        let state = HttpState::new(HttpStatePorts {
            users: store.users.clone(),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            products: store.products.clone(),
            images: Arc::new(images),
            plans: store.plans.clone(),
            visits: store.visits.clone(),
            operations: store.operations.clone(),
            live: live.clone(),
            clock: clock.clone(),
        });
        Self {
            state,
            store,
            live,
            clock,
            _dir: dir,
        }
    }

    /// Insert an account with `password` and return its id.
    pub async fn seed_user(&self, username: &str, role: Role, password: &str) -> UserId {
        use crate::domain::ports::UserRepository as _;
        use crate::domain::{DisplayName, Username};

        let verifier = Argon2PasswordHasher::new()
            .hash(password)
            .expect("hash password");
        self.store
            .users
            .insert(NewUser {
                name: DisplayName::parse(Some(username)).expect("display name"),
                username: Username::parse(Some(username)).expect("username"),
                role,
                verifier,
            })
            .await
            .expect("insert user")
            .user
            .id
    }
}
