//! Store administration commands.
//!
//! # Usage
//!
//! ```bash
//! # Add a product (the backend requires an image)
//! nexuskart admin create --name "Aero 14" --description "14-inch ultrabook" \
//!     --brand Acme --price 74999 \
//!     --category Laptop --stock 12 -i aero.png
//!
//! # Restock
//! nexuskart admin update 12 --stock 40
//! ```

use std::path::Path;

use rust_decimal::Decimal;

use nexuskart_core::{Money, ProductId};
use nexuskart_storefront::api::StorefrontClient;
use nexuskart_storefront::api::admin::low_stock as low_stock_products;
use nexuskart_storefront::error::{Result, add_breadcrumb};
use nexuskart_storefront::models::{ImageUpload, Product, ProductDraft};

use crate::output;

/// Field changes for `admin update`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub available: Option<bool>,
}

impl ProductEdit {
    fn apply(self, mut product: Product) -> Product {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(brand) = self.brand {
            product.brand = brand;
        }
        if let Some(price) = self.price {
            product.price = Money::new(price);
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(stock) = self.stock {
            product.stock_quantity = stock;
        }
        if let Some(available) = self.available {
            product.product_available = available;
        }
        product
    }
}

pub async fn stats(client: &StorefrontClient) -> Result<()> {
    let stats = client.statistics().await?;
    output::print(&output::statistics(&stats));
    Ok(())
}

pub async fn low_stock(client: &StorefrontClient) -> Result<()> {
    let products = client.all_products().await?;
    let low: Vec<Product> = low_stock_products(&products).into_iter().cloned().collect();
    if low.is_empty() {
        output::print("Every product is well stocked.");
    } else {
        output::print(&output::product_list(&low));
    }
    Ok(())
}

pub async fn create(client: &StorefrontClient, draft: ProductDraft, image: &Path) -> Result<()> {
    let image = ImageUpload::from_path(image).await?;
    let product = client.create_product(&draft, &image).await?;

    let product_id = product.id.to_string();
    add_breadcrumb("admin", "Product created", Some(&[("product_id", product_id.as_str())]));
    output::print(&format!("Created {}", output::product_row(&product)));
    Ok(())
}

/// Edit a product starting from its current record.
pub async fn update(
    client: &StorefrontClient,
    id: ProductId,
    edit: ProductEdit,
    image: Option<&Path>,
) -> Result<()> {
    let image = match image {
        Some(path) => Some(ImageUpload::from_path(path).await?),
        None => None,
    };
    let current = client.refresh_product(id).await?;
    let product = edit.apply(current);
    client.update_product(&product, image.as_ref()).await?;

    output::print(&format!("Updated {}", output::product_row(&product)));
    Ok(())
}

pub async fn delete(client: &StorefrontClient, id: ProductId) -> Result<()> {
    client.delete_product(id).await?;
    output::print(&format!("Deleted product #{id}."));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(3),
            name: "Aero 14".to_string(),
            description: "Thin".to_string(),
            brand: "Acme".to_string(),
            price: Money::from_major(74_999),
            category: "Laptop".to_string(),
            release_date: None,
            product_available: true,
            stock_quantity: 2,
            image_name: Some("aero.png".to_string()),
            image_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn test_edit_only_touches_given_fields() {
        let edit = ProductEdit {
            stock: Some(40),
            price: Some(Decimal::new(69_999, 0)),
            ..ProductEdit::default()
        };
        let updated = edit.apply(product());

        assert_eq!(updated.stock_quantity, 40);
        assert_eq!(updated.price, Money::from_major(69_999));
        assert_eq!(updated.name, "Aero 14");
        assert_eq!(updated.image_name.as_deref(), Some("aero.png"));
    }

    #[test]
    fn test_empty_edit_is_identity() {
        assert_eq!(ProductEdit::default().apply(product()), product());
    }
}
