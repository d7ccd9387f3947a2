//! Product image upload and download.
//!
//! ```text
//! POST /api/upload-image {"base64":"iVBORw0KGgo=","ext":"png"}
//! GET  /uploads/p_1718000000000_k3j9x2ab.png
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, decode_image, sanitize_extension};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::LenientJson;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Largest accepted request body; base64 images dominate.
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Image upload body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UploadRequest {
    /// Standard base64, optionally as a `data:` URL.
    pub base64: Option<String>,
    /// File extension; reduced to `[a-z0-9]`, default `png`.
    pub ext: Option<String>,
}

/// Public URL of a stored image.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
}

fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Store a product image and return its public URL.
#[utoipa::path(
    post,
    path = "/api/upload-image",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Image stored", body = UploadedImage),
        (status = 400, description = "Missing or undecodable image data", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 503, description = "Uploads directory unavailable", body = Error)
    ),
    tags = ["products"],
    operation_id = "uploadImage"
)]
#[post("/upload-image")]
pub async fn upload_image(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: LenientJson<UploadRequest>,
) -> ApiResult<web::Json<UploadedImage>> {
    let claims = session.require_claims()?;
    let body = payload.into_inner();
    let bytes = decode_image(body.base64.as_deref())?;
    let extension = sanitize_extension(body.ext.as_deref());
    let url = state
        .catalogue
        .upload_image(&claims, bytes, extension)
        .await?;
    Ok(web::Json(UploadedImage { url }))
}

/// Serve a stored image.
#[utoipa::path(
    get,
    path = "/uploads/{file}",
    params(("file" = String, Path, description = "Generated file name")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown file", body = Error)
    ),
    tags = ["products"],
    operation_id = "serveUpload",
    security([])
)]
#[get("/uploads/{file}")]
pub async fn serve_upload(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = path.into_inner();
    let bytes = state.catalogue.image(&name).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&name)))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
