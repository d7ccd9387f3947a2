//! Product catalogue handlers.
//!
//! ```text
//! GET    /api/products
//! POST   /api/products {"brand":"Acme","name":"Cardiol","image":"/uploads/p_1_ab.png"}
//! DELETE /api/products?id=3
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, FieldError, Product, ProductDraft, ProductId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{LenientJson, LooseId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Product create-or-update body; `brand` + `name` identify the product.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProductRequest {
    pub brand: Option<String>,
    pub name: Option<String>,
    /// URL returned by `/api/upload-image`.
    pub image: Option<String>,
}

/// `?id=` selector for product deletion.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductSelector {
    /// Product id.
    pub id: Option<String>,
}

/// Parse a required id query parameter.
pub(crate) fn required_query_id(raw: Option<&str>, field: &'static str) -> Result<u64, Error> {
    let resolved = match raw {
        Some(text) => LooseId::Text(text.to_owned()).resolve(field)?,
        None => None,
    };
    resolved.ok_or_else(|| FieldError::missing(field).into())
}

/// Catalogue visible to any signed-in user.
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Products", body = [Product]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Data store unavailable", body = Error)
    ),
    tags = ["products"],
    operation_id = "listProducts"
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Product>>> {
    session.require_claims()?;
    Ok(web::Json(state.catalogue.list().await?))
}

/// Create a product or update the one with the same brand and name.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Saved product", body = Product),
        (status = 400, description = "Missing name", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["products"],
    operation_id = "upsertProduct"
)]
#[post("/products")]
pub async fn upsert_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: LenientJson<ProductRequest>,
) -> ApiResult<web::Json<Product>> {
    let claims = session.require_claims()?;
    let body = payload.into_inner();
    let draft = ProductDraft::try_from_parts(
        body.brand.as_deref(),
        body.name.as_deref(),
        body.image.as_deref(),
    )?;
    Ok(web::Json(state.catalogue.upsert(&claims, draft).await?))
}

/// Remove a product. Visits that reference it report it as unknown.
#[utoipa::path(
    delete,
    path = "/api/products",
    params(ProductSelector),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Missing or invalid id", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "Unknown product", body = Error)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ProductSelector>,
) -> ApiResult<HttpResponse> {
    let claims = session.require_claims()?;
    let id = required_query_id(query.id.as_deref(), "id")?;
    state.catalogue.delete(&claims, ProductId::new(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;

    use crate::domain::Role;
    use crate::inbound::http::test_utils::{StoreFixture, api_app, json_body, login};

    #[rstest]
    #[actix_web::test]
    async fn products_require_a_session() {
        let store = StoreFixture::new();
        let app = actix_test::init_service(api_app(&store)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/products").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn upsert_keys_on_brand_and_name() {
        let store = StoreFixture::new();
        store.seed_user("admin", Role::Admin, "admin").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let cookie = login(&app, "admin", "admin").await;

        let mut ids = Vec::new();
        for image in ["/uploads/a.png", "/uploads/b.png"] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/products")
                    .cookie(cookie.clone())
                    .set_json(json!({"brand": "Acme", "name": "Cardiol", "image": image}))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
            ids.push(json_body(res).await["id"].clone());
        }
        assert_eq!(ids[0], ids[1]);

        let listed = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/products")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let listed = json_body(listed).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["image"], "/uploads/b.png");
    }

    #[rstest]
    #[actix_web::test]
    async fn reps_cannot_edit_the_catalogue() {
        let store = StoreFixture::new();
        store.seed_user("sara", Role::Rep, "pw").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let cookie = login(&app, "sara", "pw").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/products")
                .cookie(cookie)
                .set_json(json!({"name": "Cardiol"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case("/api/products", StatusCode::BAD_REQUEST)]
    #[case("/api/products?id=abc", StatusCode::BAD_REQUEST)]
    #[case("/api/products?id=99", StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn delete_validates_the_selector(#[case] uri: &str, #[case] expected: StatusCode) {
        let store = StoreFixture::new();
        store.seed_user("admin", Role::Admin, "admin").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let cookie = login(&app, "admin", "admin").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri(uri).cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), expected);
        let body = json_body(res).await;
        if expected == StatusCode::BAD_REQUEST {
            assert_eq!(body["details"]["field"], "id");
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_removes_the_product() {
        let store = StoreFixture::new();
        store.seed_user("admin", Role::Admin, "admin").await;
        let app = actix_test::init_service(api_app(&store)).await;
        let cookie = login(&app, "admin", "admin").await;
        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/products")
                .cookie(cookie.clone())
                .set_json(json!({"name": "Cardiol"}))
                .to_request(),
        )
        .await;
        let id = json_body(created).await["id"].clone();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/products?id={id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
