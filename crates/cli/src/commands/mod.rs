//! Command handlers.
//!
//! Each handler talks to the store through the shared client, prints its
//! result and returns `AppError` on failure; `main` owns reporting.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::path::Path;

use nexuskart_storefront::error::Result;
use nexuskart_storefront::models::ImageData;

/// Write downloaded image bytes to `out`.
async fn save_image(image: &ImageData, out: &Path) -> Result<()> {
    tokio::fs::write(out, &image.bytes).await?;
    tracing::info!(
        path = %out.display(),
        bytes = image.bytes.len(),
        content_type = %image.content_type,
        "Image saved"
    );
    Ok(())
}
