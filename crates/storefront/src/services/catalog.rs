//! Product lookup.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use stride_core::{Product, ProductId};

use super::{CommerceError, with_deadline};
use crate::db::CatalogStore;

/// Read-only access to catalog products.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    /// Fetch a product.
    ///
    /// # Errors
    ///
    /// `ProductNotFound` if no such product exists.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CommerceError> {
        with_deadline(self.timeout, "get_product", async {
            self.catalog
                .get_product(id)
                .await?
                .ok_or(CommerceError::ProductNotFound)
        })
        .await
    }
}
