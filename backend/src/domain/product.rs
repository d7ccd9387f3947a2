//! Product catalogue entries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::record_id::{Identified, record_id};
use super::validation::{FieldError, bounded, optional_text, required_text};

record_id! {
    /// Positive integer identifying a product.
    ProductId
}

/// Longest accepted brand or product name.
pub const PRODUCT_TEXT_MAX: usize = 120;

/// A promoted product, unique by `(brand, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Manufacturer brand; may be empty.
    #[serde(default)]
    pub brand: String,
    /// Product name.
    pub name: String,
    /// Relative URL of the product image.
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Label used in live events: `brand — name`, or just the name when the
    /// brand is empty.
    ///
    /// # Examples
    /// ```
    /// use medrep::domain::{Product, ProductId};
    ///
    /// let product = Product {
    ///     id: ProductId::new(1),
    ///     brand: "Acme".into(),
    ///     name: "Cardiol".into(),
    ///     image: None,
    /// };
    /// assert_eq!(product.label(), "Acme — Cardiol");
    /// ```
    pub fn label(&self) -> String {
        if self.brand.is_empty() {
            self.name.clone()
        } else {
            format!("{} — {}", self.brand, self.name)
        }
    }

    /// Whether this product has the given catalogue key.
    pub fn matches(&self, brand: &str, name: &str) -> bool {
        self.brand == brand && self.name == name
    }
}

impl Identified for Product {
    fn raw_id(&self) -> u64 {
        self.id.get()
    }
}

/// Validated product fields submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Brand, trimmed; empty when not supplied.
    pub brand: String,
    /// Name, trimmed and non-empty.
    pub name: String,
    /// Optional image URL.
    pub image: Option<String>,
}

impl ProductDraft {
    /// Validate raw product fields.
    pub fn try_from_parts(
        brand: Option<&str>,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<Self, FieldError> {
        let name = bounded(required_text(name, "name")?, "name", PRODUCT_TEXT_MAX)?;
        let brand = bounded(
            optional_text(brand).unwrap_or_default(),
            "brand",
            PRODUCT_TEXT_MAX,
        )?;
        Ok(Self {
            brand,
            name,
            image: optional_text(image),
        })
    }
}
