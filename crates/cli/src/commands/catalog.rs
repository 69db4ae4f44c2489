//! Catalog browsing and reviews.

use std::path::Path;

use nexuskart_core::ProductId;
use nexuskart_storefront::api::{ApiError, AuthError, StorefrontClient};
use nexuskart_storefront::error::{Result, add_breadcrumb};
use nexuskart_storefront::models::{ProductQuery, ReviewInput};

use crate::output;

pub async fn list(
    client: &StorefrontClient,
    category: Option<String>,
    keyword: Option<String>,
    page: u32,
    size: u32,
) -> Result<()> {
    let query = ProductQuery {
        page,
        size,
        category,
        keyword,
    };
    let products = client.list_products(&query).await?;
    output::print(&output::product_page(&products));
    Ok(())
}

pub async fn all(client: &StorefrontClient) -> Result<()> {
    let products = client.all_products().await?;
    output::print(&output::product_list(&products));
    Ok(())
}

pub async fn search(client: &StorefrontClient, keyword: &str) -> Result<()> {
    let products = client.search_products(keyword).await?;
    output::print(&output::product_list(&products));
    Ok(())
}

/// Product details with its reviews, fetched concurrently.
pub async fn show(client: &StorefrontClient, id: ProductId) -> Result<()> {
    let (product, reviews) = tokio::join!(client.get_product(id), client.reviews(id));
    let product = product?;
    // A product without a reviews endpoint still shows.
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::warn!(product_id = %id, error = %e, "Could not load reviews");
        Vec::new()
    });
    output::print(&output::product_detail(&product, &reviews));
    Ok(())
}

pub async fn image(client: &StorefrontClient, id: ProductId, out: &Path) -> Result<()> {
    let image = client.product_image(id).await?;
    super::save_image(&image, out).await?;
    output::print(&format!("Saved image of product #{id} to {}", out.display()));
    Ok(())
}

pub async fn reviews(client: &StorefrontClient, id: ProductId) -> Result<()> {
    let reviews = client.reviews(id).await?;
    if reviews.is_empty() {
        output::print("No reviews yet.");
        return Ok(());
    }
    for review in &reviews {
        output::print(&format!(
            "{}/5 {}: {}",
            review.rating, review.user_name, review.comment
        ));
    }
    Ok(())
}

/// Review a product under the signed-in user's name.
pub async fn add_review(
    client: &StorefrontClient,
    id: ProductId,
    rating: u8,
    comment: String,
) -> Result<()> {
    let session = client
        .session()
        .await
        .ok_or(ApiError::Auth(AuthError::NotLoggedIn))?;

    let input = ReviewInput {
        user_name: session.user().name.clone(),
        rating,
        comment,
    };
    client.add_review(id, &input).await?;

    let product_id = id.to_string();
    add_breadcrumb("review", "Review posted", Some(&[("product_id", product_id.as_str())]));
    output::print(&format!("Thanks for reviewing product #{id}."));
    Ok(())
}
