//! Back-office endpoints. Every call here needs an admin session.

use reqwest::Method;
use tracing::{info, instrument};

use nexuskart_core::ProductId;

use super::client::{Access, Body, StorefrontClient, product_form};
use super::ApiError;
use crate::models::{ImageUpload, Product, ProductDraft, StoreStatistics};

/// Stock level at or below which a product counts as low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

impl StorefrontClient {
    /// Create a product. The backend requires an image.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete listing, `AuthError` for
    /// non-admin sessions, or an error if the API request fails.
    #[instrument(skip(self, draft, image), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        image: &ImageUpload,
    ) -> Result<Product, ApiError> {
        draft.validate()?;

        let url = self.endpoint("product")?;
        let form = product_form(draft, Some(image))?;
        let product: Product = self
            .execute_json(Method::POST, url, Access::Admin, Body::Multipart(form))
            .await?;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product record. Without `image` the stored image is kept.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete listing, `AuthError` for
    /// non-admin sessions, or an error if the API request fails.
    #[instrument(skip(self, product, image), fields(product_id = %product.id))]
    pub async fn update_product(
        &self,
        product: &Product,
        image: Option<&ImageUpload>,
    ) -> Result<(), ApiError> {
        product.validate()?;

        let url = self.endpoint(&format!("product/{}", product.id))?;
        let form = product_form(product, image)?;
        self.execute_text(Method::PUT, url, Access::Admin, Body::Multipart(form))
            .await?;

        self.invalidate_product(product.id).await;
        info!("Product updated");
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if it does not exist, `AuthError` for
    /// non-admin sessions, or an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("product/{id}"))?;
        self.execute_text(Method::DELETE, url, Access::Admin, Body::Empty)
            .await?;

        self.invalidate_product(id).await;
        info!("Product deleted");
        Ok(())
    }

    /// Dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for non-admin sessions, or an error if the API
    /// request fails.
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<StoreStatistics, ApiError> {
        let url = self.endpoint("statistics")?;
        self.execute_json(Method::GET, url, Access::Admin, Body::Empty)
            .await
    }
}

/// Products at or below [`LOW_STOCK_THRESHOLD`], lowest stock first.
#[must_use]
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.stock_quantity <= LOW_STOCK_THRESHOLD)
        .collect();
    low.sort_by_key(|p| (p.stock_quantity, p.id));
    low
}
