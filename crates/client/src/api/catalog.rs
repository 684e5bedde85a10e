//! Catalog service client.
//!
//! Product and category reads. Product-by-id lookups are cached in memory
//! with a short TTL, since product pages are the hottest path in the shop
//! and the catalog changes rarely.

use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use souk_core::ProductId;

use crate::error::ApiError;
use crate::models::{Category, Product, ProductFilters, ProductPage};
use crate::transport::Transport;

/// How long a cached product stays fresh.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum number of cached products.
const PRODUCT_CACHE_CAPACITY: u64 = 1_000;

/// Client for the catalog (product + category) service.
#[derive(Clone)]
pub struct CatalogClient {
    transport: Transport,
    products_base: String,
    categories_base: String,
    product_cache: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a catalog client.
    #[must_use]
    pub fn new(transport: Transport, products_base: String, categories_base: String) -> Self {
        Self {
            transport,
            products_base,
            categories_base,
            product_cache: Cache::builder()
                .max_capacity(PRODUCT_CACHE_CAPACITY)
                .time_to_live(PRODUCT_CACHE_TTL)
                .build(),
        }
    }

    /// List products with filters, pagination and sorting.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the catalog service call fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filters: &ProductFilters) -> Result<ProductPage, ApiError> {
        let request = self
            .transport
            .http()
            .get(&self.products_base)
            .query(&filters.to_query());
        self.transport.send(request).await
    }

    /// Fetch a single product, serving repeated lookups from the cache.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(cached) = self.product_cache.get(&id).await {
            return Ok(cached);
        }

        let request = self
            .transport
            .http()
            .get(format!("{}/{id}", self.products_base));
        let product: Product = self.transport.send(request).await?;
        self.product_cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Search products by name.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the catalog service call fails.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<ProductPage, ApiError> {
        let filters = ProductFilters {
            search: Some(query.to_owned()),
            page: Some(page),
            size: Some(size),
            ..ProductFilters::default()
        };
        self.products(&filters).await
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the category service call fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let request = self.transport.http().get(&self.categories_base);
        self.transport.send(request).await
    }

    /// List root categories (the top of the category tree).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the category service call fails.
    pub async fn root_categories(&self) -> Result<Vec<Category>, ApiError> {
        let request = self
            .transport
            .http()
            .get(format!("{}/root", self.categories_base));
        self.transport.send(request).await
    }

    /// Drop everything from the product cache.
    pub fn invalidate_cache(&self) {
        self.product_cache.invalidate_all();
    }
}
