//! Catalog endpoints: listings, search, product detail, images and reviews.

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};

use nexuskart_core::ProductId;

use super::cache::{CacheKey, CacheValue};
use super::client::{Access, Body, StorefrontClient};
use super::ApiError;
use crate::cart::CatalogSnapshot;
use crate::models::{ImageData, Page, Product, ProductQuery, Review, ReviewInput};

impl StorefrontClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the catalog, optionally filtered.
    ///
    /// Listings are never cached: they feed stock levels into the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page, size = query.size))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());

        let page: Page<Product> = self
            .execute_json(Method::GET, url, Access::Public, Body::Empty)
            .await?;
        debug!(
            count = page.content.len(),
            total = page.total_elements,
            "Fetched catalog page"
        );
        Ok(page)
    }

    /// Get the whole catalog in one unpaginated request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint("products")?;
        self.execute_json(Method::GET, url, Access::Public, Body::Empty)
            .await
    }

    /// The set of product ids that currently exist, for cart reconciliation.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn catalog_snapshot(&self) -> Result<CatalogSnapshot, ApiError> {
        let products = self.all_products().await?;
        Ok(CatalogSnapshot::from_products(&products))
    }

    /// Unpaginated keyword search.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyword is blank or the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, ApiError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ApiError::Validation("search keyword is required".to_string()));
        }

        let mut url = self.endpoint("products/search")?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        self.execute_json(Method::GET, url, Access::Public, Body::Empty)
            .await
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cache_get(cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("product/{id}"))?;
        let product: Product = self
            .execute_json(Method::GET, url, Access::Public, Body::Empty)
            .await?;

        self.cache_insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a product by id, bypassing the cache.
    ///
    /// Used when the stock level matters, such as adding to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    pub async fn refresh_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.cache_invalidate(CacheKey::Product(id)).await;
        self.get_product(id).await
    }

    /// Get a product's image bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the product has no image or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_image(&self, id: ProductId) -> Result<Arc<ImageData>, ApiError> {
        let cache_key = CacheKey::ProductImage(id);

        if let Some(CacheValue::Image(image)) = self.cache_get(cache_key).await {
            debug!("Cache hit for product image");
            return Ok(image);
        }

        let url = self.endpoint(&format!("product/{id}/image"))?;
        let image = Arc::new(self.execute_image(url, Access::Public).await?);

        self.cache_insert(cache_key, CacheValue::Image(Arc::clone(&image)))
            .await;

        Ok(image)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List the reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reviews(&self, id: ProductId) -> Result<Vec<Review>, ApiError> {
        let url = self.endpoint(&format!("product/{id}/reviews"))?;
        self.execute_json(Method::GET, url, Access::Public, Body::Empty)
            .await
    }

    /// Post a review as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the review is invalid, no one is signed in, or the
    /// API request fails.
    #[instrument(skip(self, review), fields(product_id = %id, rating = review.rating))]
    pub async fn add_review(&self, id: ProductId, review: &ReviewInput) -> Result<Review, ApiError> {
        review.validate()?;

        let url = self.endpoint(&format!("product/{id}/reviews"))?;
        let body = json!({
            "userName": review.user_name.trim(),
            "rating": review.rating,
            "comment": review.comment.trim(),
        });
        self.execute_json(Method::POST, url, Access::User, Body::Json(body))
            .await
    }
}
