//! Cart and checkout commands.
//!
//! The cart itself lives in the session file; these handlers mutate the
//! `CartStore` that `main` restored and saves afterwards.

use nexuskart_core::{PaymentMethod, ProductId};
use nexuskart_storefront::api::StorefrontClient;
use nexuskart_storefront::cart::{CartLine, CartStore, CheckoutOptions};
use nexuskart_storefront::error::{AppError, Result, add_breadcrumb};

use crate::output;

pub fn show(cart: &CartStore) {
    output::print(&output::cart(cart));
}

/// Add one unit, using a fresh copy of the product so stock is current.
pub async fn add(client: &StorefrontClient, cart: &mut CartStore, id: ProductId) -> Result<()> {
    let product = client.refresh_product(id).await?;
    let quantity = cart.add(&product)?;

    let product_id = id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    output::print(&format!(
        "Added {} to your cart ({quantity} in cart).",
        product.name
    ));
    Ok(())
}

pub fn change_quantity(cart: &mut CartStore, id: ProductId, delta: i64) -> Result<()> {
    let change = cart
        .set_quantity(id, delta)
        .ok_or_else(|| not_in_cart(id))?;

    if change.clamped && delta < 0 {
        output::print("Quantity cannot go below 1; use `cart remove` to drop the line.");
    } else if change.clamped {
        output::print(&format!(
            "Quantity capped at {}, the stock available.",
            change.quantity
        ));
    } else {
        output::print(&format!("Quantity set to {}.", change.quantity));
    }
    Ok(())
}

/// Remove a line. Removing a product that is not in the cart changes nothing.
pub fn remove(cart: &mut CartStore, id: ProductId) {
    output::print(&remove_message(cart.remove(id).as_ref(), id));
}

fn remove_message(removed: Option<&CartLine>, id: ProductId) -> String {
    removed.map_or_else(
        || format!("Product #{id} is not in your cart."),
        |line| format!("Removed {} from your cart.", line.name()),
    )
}

/// Drop lines whose product has left the catalog.
pub async fn sync(client: &StorefrontClient, cart: &mut CartStore) -> Result<()> {
    let dropped = sync_with_catalog(client, cart).await?;
    if dropped == 0 {
        output::print("Your cart is up to date.");
    }
    Ok(())
}

async fn sync_with_catalog(client: &StorefrontClient, cart: &mut CartStore) -> Result<usize> {
    if cart.is_empty() {
        return Ok(0);
    }
    let catalog = client.catalog_snapshot().await?;
    let dropped = cart.reconcile_with_catalog(&catalog);
    for line in &dropped {
        output::print(&format!(
            "{} is no longer sold and was removed from your cart.",
            line.name()
        ));
    }
    Ok(dropped.len())
}

pub fn clear(cart: &mut CartStore) {
    cart.clear();
    output::print("Your cart is empty.");
}

/// Check out the whole cart.
///
/// Unless `skip_sync` is set, lines for products that left the catalog are
/// dropped first so the order only contains products that still exist.
pub async fn checkout(
    client: &StorefrontClient,
    cart: &mut CartStore,
    payment_method: PaymentMethod,
    address: Option<String>,
    skip_sync: bool,
) -> Result<()> {
    if !skip_sync {
        sync_with_catalog(client, cart).await?;
    }

    let mut options = CheckoutOptions {
        payment_method,
        ..CheckoutOptions::default()
    };
    if let Some(address) = address.filter(|a| !a.trim().is_empty()) {
        options.shipping_address = address;
    }

    add_breadcrumb(
        "checkout",
        "Checkout started",
        Some(&[("payment_method", payment_method.label())]),
    );
    let receipt = cart.checkout(client, &options).await?;

    let order_id = receipt.order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
    output::print(&output::receipt(&receipt));
    Ok(())
}

fn not_in_cart(id: ProductId) -> AppError {
    AppError::BadRequest(format!("Product #{id} is not in your cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexuskart_core::Money;
    use nexuskart_storefront::models::Product;

    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Item {id}"),
            description: "A product".to_string(),
            brand: "Acme".to_string(),
            price: Money::from_major(100),
            category: "Laptop".to_string(),
            release_date: None,
            product_available: true,
            stock_quantity: 3,
            image_name: None,
            image_type: None,
        }
    }

    #[test]
    fn test_removing_absent_product_is_a_no_op() {
        let mut cart = CartStore::new();
        cart.add(&product(1)).unwrap();
        let before = cart.snapshot();

        remove(&mut cart, ProductId::new(9));
        remove(&mut cart, ProductId::new(9));

        assert_eq!(cart.snapshot(), before);
        assert_eq!(
            remove_message(None, ProductId::new(9)),
            "Product #9 is not in your cart."
        );
    }

    #[test]
    fn test_remove_drops_the_line() {
        let mut cart = CartStore::new();
        cart.add(&product(1)).unwrap();

        let line = cart.get(ProductId::new(1)).cloned();
        assert_eq!(
            remove_message(line.as_ref(), ProductId::new(1)),
            "Removed Item 1 from your cart."
        );

        remove(&mut cart, ProductId::new(1));
        assert!(cart.is_empty());
    }
}
