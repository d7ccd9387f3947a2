//! Port for the product catalogue.

use async_trait::async_trait;

use crate::domain::{Product, ProductDraft, ProductId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by product repository adapters.
    pub enum ProductRepositoryError {
        /// The backing store could not be written.
        Storage { message } => "product store write failed: {message}",
    }
}

/// Product catalogue storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in id order.
    async fn list(&self) -> Result<Vec<Product>, ProductRepositoryError>;

    /// Insert a product, or update the image of the product already holding
    /// the same `(brand, name)` pair.
    async fn upsert(&self, draft: ProductDraft) -> Result<Product, ProductRepositoryError>;

    /// Remove a product; `false` when it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, ProductRepositoryError>;
}
