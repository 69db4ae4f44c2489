//! Order placement, order history and checkout stock updates.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, instrument};

use super::client::{Access, Body, StorefrontClient, product_form};
use super::ApiError;
use crate::cart::CheckoutBackend;
use crate::models::{Order, OrderRequest, Product};

impl StorefrontClient {
    /// Place an order for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is signed in or the API request fails.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total_amount))]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<Order, ApiError> {
        let url = self.endpoint("orders/place")?;
        let body = serde_json::to_value(order)?;
        let placed: Order = self
            .execute_json(Method::POST, url, Access::User, Body::Json(body))
            .await?;
        info!(order_id = %placed.id, "Order placed");
        Ok(placed)
    }

    /// The signed-in user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is signed in or the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("orders/my-orders")?;
        self.execute_json(Method::GET, url, Access::User, Body::Empty)
            .await
    }

    /// Every order in the store. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("orders")?;
        self.execute_json(Method::GET, url, Access::Admin, Body::Empty)
            .await
    }

    /// Write `product` back with its stock lowered by `quantity`.
    ///
    /// This is a whole-record update, not an atomic decrement: the new level
    /// is computed from the stock seen when the product was fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is signed in or the API request fails.
    #[instrument(skip(self, product), fields(product_id = %product.id, stock = product.stock_quantity))]
    pub async fn decrement_stock(&self, product: &Product, quantity: u32) -> Result<(), ApiError> {
        let remaining = product.stock_quantity.saturating_sub(quantity);
        let updated = product.with_stock(remaining);

        let url = self.endpoint(&format!("product/{}", product.id))?;
        let form = product_form(&updated, None)?;
        self.execute_text(Method::PUT, url, Access::User, Body::Multipart(form))
            .await?;

        self.invalidate_product(product.id).await;
        info!(remaining, "Stock decremented");
        Ok(())
    }
}

#[async_trait]
impl CheckoutBackend for StorefrontClient {
    async fn decrement_stock(&self, product: &Product, quantity: u32) -> Result<(), ApiError> {
        Self::decrement_stock(self, product, quantity).await
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<Order, ApiError> {
        Self::place_order(self, order).await
    }
}
