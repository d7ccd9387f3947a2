//! `products.json` adapter for [`ProductRepository`].

use async_trait::async_trait;

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{Product, ProductDraft, ProductId, next_id};

use super::json_collection::{Change, JsonCollection};

/// Products stored in `products.json`.
pub struct JsonProductRepository {
    rows: JsonCollection<Product>,
}

impl JsonProductRepository {
    /// Repository over `rows`.
    pub fn new(rows: JsonCollection<Product>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl ProductRepository for JsonProductRepository {
    async fn list(&self) -> Result<Vec<Product>, ProductRepositoryError> {
        Ok(self.rows.load().await)
    }

    async fn upsert(&self, draft: ProductDraft) -> Result<Product, ProductRepositoryError> {
        self.rows
            .update(|products| {
                if let Some(existing) = products
                    .iter_mut()
                    .find(|product| product.matches(&draft.brand, &draft.name))
                {
                    if draft.image.is_none() || existing.image == draft.image {
                        return Change::Keep(existing.clone());
                    }
                    existing.image = draft.image;
                    return Change::Write(existing.clone());
                }
                let product = Product {
                    id: ProductId::new(next_id(products)),
                    brand: draft.brand,
                    name: draft.name,
                    image: draft.image,
                };
                products.push(product.clone());
                Change::Write(product)
            })
            .await
            .map_err(|err| ProductRepositoryError::storage(err.to_string()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ProductRepositoryError> {
        self.rows
            .update(|products| {
                let before = products.len();
                products.retain(|product| product.id != id);
                if products.len() == before {
                    Change::Keep(false)
                } else {
                    Change::Write(true)
                }
            })
            .await
            .map_err(|err| ProductRepositoryError::storage(err.to_string()))
    }
}
