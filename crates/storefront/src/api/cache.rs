//! Cache types for backend responses.

use std::sync::Arc;

use nexuskart_core::ProductId;

use crate::models::{ImageData, Product};

/// Cache key for product details and images.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    ProductImage(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Image(Arc<ImageData>),
}
