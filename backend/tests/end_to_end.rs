//! End-to-end flows through the full route table over a scratch data
//! directory: catalogue, visits, reports and access control.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use camino::Utf8Path;
use chrono::Duration;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

use medrep::Trace;
use medrep::inbound::http::session::SessionPolicy;
use medrep::inbound::http::state::{HttpState, HttpStatePorts};
use medrep::inbound::http::{configure, not_found};
use medrep::outbound::live::BroadcastLiveFeed;
use medrep::outbound::persistence::{DataStore, ensure_admin};
use medrep::outbound::security::Argon2PasswordHasher;
use medrep::outbound::uploads::DirImageStore;

struct Deployment {
    state: HttpState,
    policy: SessionPolicy,
    _dir: TempDir,
}

#[fixture]
async fn deployment() -> Deployment {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8Path::from_path(dir.path()).expect("utf-8 path");
    let store = DataStore::open(root).expect("data store");
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let images = DirImageStore::open(&root.join("uploads"), Arc::clone(&clock)).expect("uploads");
    ensure_admin(&store.users, &Argon2PasswordHasher::new(), Some("admin"))
        .await
        .expect("seed admin");
    let state = HttpState::new(HttpStatePorts {
        users: store.users.clone(),
        hasher: Arc::new(Argon2PasswordHasher::new()),
        products: store.products.clone(),
        images: Arc::new(images),
        plans: store.plans.clone(),
        visits: store.visits.clone(),
        operations: store.operations.clone(),
        live: Arc::new(BroadcastLiveFeed::default()),
        clock: clock.clone(),
    });
    Deployment {
        state,
        policy: SessionPolicy::new(clock, Duration::hours(12)),
        _dir: dir,
    }
}

async fn start(
    deployment: &Deployment,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    test::init_service(
        App::new()
            .app_data(web::Data::new(deployment.state.clone()))
            .app_data(web::Data::new(deployment.policy.clone()))
            .wrap(session)
            .wrap(Trace)
            .configure(configure)
            .default_service(web::to(not_found)),
    )
    .await
}

async fn send<S>(app: &S, req: test::TestRequest) -> (StatusCode, Value, Option<Cookie<'static>>)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned);
    let body = test::read_body(res).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, json, cookie)
}

async fn login<S>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, _, cookie) = send(
        app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login as {username}");
    cookie.expect("session cookie")
}

#[rstest]
#[actix_web::test]
async fn visits_flow_from_catalogue_to_reports(#[future] deployment: Deployment) {
    let deployment = deployment.await;
    let app = start(&deployment).await;
    let admin = login(&app, "admin", "admin").await;

    let (status, product, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/products")
            .cookie(admin.clone())
            .set_json(json!({"brand": "X", "name": "Y"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, products, _) = send(
        &app,
        test::TestRequest::get().uri("/api/products").cookie(admin.clone()),
    )
    .await;
    assert!(
        products
            .as_array()
            .expect("product list")
            .iter()
            .any(|entry| entry["brand"] == "X" && entry["name"] == "Y"),
        "{products}"
    );

    let (status, _, rep) = send(
        &app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": "Sara Karimi",
            "username": "sara",
            "password": "pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rep = rep.expect("registration signs in");

    let visit = json!({
        "op_id": "visit-1",
        "date": "2024-01-10",
        "doctor": "Dr.Z",
        "product_id": product["id"],
    });
    let report = "/api/reports/by-product?from=2024-01-01&to=2024-01-31";
    for attempt in 0..2 {
        let (status, ack, _) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/visits")
                .cookie(rep.clone())
                .set_json(visit.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["replayed"], attempt > 0);

        let (status, tally, _) = send(
            &app,
            test::TestRequest::get().uri(report).cookie(admin.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tally, json!([{"brand": "X", "product": "Y", "count": 1}]));
    }
}

#[rstest]
#[actix_web::test]
async fn reps_cannot_edit_the_catalogue(#[future] deployment: Deployment) {
    let deployment = deployment.await;
    let app = start(&deployment).await;
    let (_, _, rep) = send(
        &app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": "Sara Karimi",
            "username": "sara",
            "password": "pw",
        })),
    )
    .await;

    let (status, body, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/products")
            .cookie(rep.expect("session cookie"))
            .set_json(json!({"brand": "X", "name": "Y"})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[rstest]
#[actix_web::test]
async fn wrong_password_is_unauthorized(#[future] deployment: Deployment) {
    let deployment = deployment.await;
    let app = start(&deployment).await;

    let (status, body, cookie) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"username": "admin", "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    assert!(body["traceId"].is_string(), "{body}");
    assert!(cookie.is_none());
}
