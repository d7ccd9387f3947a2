//! Product catalogue and product image management.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::info;

use super::ports::{ImageStore, ImageStoreError, ProductRepository};
use super::validation::{FieldError, FieldErrorCode};
use super::{Error, Product, ProductDraft, ProductId, Role, SessionClaims};

/// Public URL prefix for stored images.
pub const UPLOADS_PREFIX: &str = "/uploads/";
/// Extension used when none survives sanitising.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";
const EXTENSION_MAX: usize = 10;

/// Reduce a client-supplied extension to lowercase `[a-z0-9]`.
///
/// # Examples
/// ```
/// use medrep::domain::sanitize_extension;
///
/// assert_eq!(sanitize_extension(Some(".JPG")), "jpg");
/// assert_eq!(sanitize_extension(Some("../../x")), "x");
/// assert_eq!(sanitize_extension(Some("!!")), "png");
/// assert_eq!(sanitize_extension(None), "png");
/// ```
pub fn sanitize_extension(raw: Option<&str>) -> String {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .take(EXTENSION_MAX)
        .collect();
    if cleaned.is_empty() {
        DEFAULT_IMAGE_EXTENSION.to_owned()
    } else {
        cleaned
    }
}

/// Decode base64 image data, tolerating a `data:…;base64,` prefix.
pub fn decode_image(raw: Option<&str>) -> Result<Vec<u8>, FieldError> {
    let text = raw.map(str::trim).unwrap_or_default();
    let text = match text.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => text,
    };
    if text.is_empty() {
        return Err(FieldError::missing("base64"));
    }
    let bytes = STANDARD.decode(text).map_err(|_| {
        FieldError::new(
            "base64",
            FieldErrorCode::InvalidValue,
            "base64 must be standard base64 data",
        )
    })?;
    if bytes.is_empty() {
        return Err(FieldError::missing("base64"));
    }
    Ok(bytes)
}

/// Manages products and their images.
#[derive(Clone)]
pub struct CatalogueService {
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStore>,
}

impl CatalogueService {
    /// Create the service.
    pub fn new(products: Arc<dyn ProductRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { products, images }
    }

    /// Every product.
    pub async fn list(&self) -> Result<Vec<Product>, Error> {
        self.products.list().await.map_err(Error::storage)
    }

    /// Create a product, or refresh the image of an existing `(brand, name)`.
    pub async fn upsert(
        &self,
        caller: &SessionClaims,
        draft: ProductDraft,
    ) -> Result<Product, Error> {
        caller.require_role(Role::Admin)?;
        let product = self.products.upsert(draft).await.map_err(Error::storage)?;
        info!(product_id = %product.id, "product saved");
        Ok(product)
    }

    /// Remove a product.
    pub async fn delete(&self, caller: &SessionClaims, id: ProductId) -> Result<(), Error> {
        caller.require_role(Role::Admin)?;
        if !self.products.delete(id).await.map_err(Error::storage)? {
            return Err(Error::not_found(format!("product {id} not found")));
        }
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Store an uploaded image and return its public URL.
    pub async fn upload_image(
        &self,
        caller: &SessionClaims,
        bytes: Vec<u8>,
        extension: String,
    ) -> Result<String, Error> {
        caller.require_role(Role::Admin)?;
        let size = bytes.len();
        let name = self
            .images
            .save(bytes, extension)
            .await
            .map_err(Error::storage)?;
        info!(file = %name, size, "image stored");
        Ok(format!("{UPLOADS_PREFIX}{name}"))
    }

    /// Bytes of a stored image.
    pub async fn image(&self, name: &str) -> Result<Vec<u8>, Error> {
        match self.images.load(name.to_owned()).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) | Err(ImageStoreError::InvalidName { .. }) => {
                Err(Error::not_found("image not found"))
            }
            Err(err) => Err(Error::storage(err)),
        }
    }
}
