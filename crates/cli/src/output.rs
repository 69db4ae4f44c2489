//! Plain-text rendering of storefront data.
//!
//! Everything here returns a `String` so commands decide where it goes.

use std::fmt::Write as _;

use nexuskart_storefront::api::admin::LOW_STOCK_THRESHOLD;
use nexuskart_storefront::cart::{CartLine, CartStore, CheckoutReceipt};
use nexuskart_storefront::models::review::average_rating;
use nexuskart_storefront::models::{Order, Page, Product, Review, StoreStatistics, UserProfile};

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{text}");
}

/// Stock badge shown next to a product.
#[must_use]
pub fn stock_label(product: &Product) -> String {
    if !product.in_stock() {
        "Out of stock".to_string()
    } else if product.stock_quantity <= LOW_STOCK_THRESHOLD {
        format!("Only {} left", product.stock_quantity)
    } else {
        "In stock".to_string()
    }
}

#[must_use]
pub fn product_row(product: &Product) -> String {
    format!(
        "#{} {} ({}) {}  [{}]",
        product.id,
        product.name,
        product.brand,
        product.price,
        stock_label(product)
    )
}

/// A catalog page with a pagination footer.
#[must_use]
pub fn product_page(page: &Page<Product>) -> String {
    if page.content.is_empty() {
        return "No products found.".to_string();
    }
    let mut out = product_list(&page.content);
    let _ = write!(
        out,
        "\nPage {} of {} ({} products)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
    if page.has_more() {
        out.push_str(" - use --page to see more");
    }
    out
}

#[must_use]
pub fn product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }
    products
        .iter()
        .map(product_row)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Product detail page with its reviews.
#[must_use]
pub fn product_detail(product: &Product, reviews: &[Review]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} by {}", product.name, product.brand);
    let _ = writeln!(out, "{}  [{}]", product.price, stock_label(product));
    let _ = writeln!(out, "Category: {}", product.category);
    if let Some(date) = product.release_date {
        let _ = writeln!(out, "Released: {date}");
    }
    if !product.description.is_empty() {
        let _ = writeln!(out, "\n{}", product.description);
    }

    match average_rating(reviews) {
        Some(avg) => {
            let _ = write!(out, "\nReviews: {avg:.1}/5 from {}", reviews.len());
        }
        None => out.push_str("\nNo reviews yet"),
    }
    for review in reviews {
        let _ = write!(
            out,
            "\n  {} {}: {}",
            stars(review.rating),
            review.user_name,
            review.comment
        );
    }
    out
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

fn cart_line(line: &CartLine) -> String {
    format!(
        "#{} {} ({})  {} x {} = {}",
        line.product_id(),
        line.name(),
        line.brand(),
        line.quantity(),
        line.unit_price(),
        line.line_total()
    )
}

/// The cart view: one row per line and the subtotal.
#[must_use]
pub fn cart(cart: &CartStore) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let mut out = cart
        .lines()
        .iter()
        .map(cart_line)
        .collect::<Vec<_>>()
        .join("\n");
    let count = cart.item_count();
    let _ = write!(
        out,
        "\nSubtotal ({count} item{}): {}",
        if count == 1 { "" } else { "s" },
        cart.total()
    );
    out
}

#[must_use]
pub fn receipt(receipt: &CheckoutReceipt) -> String {
    let mut out = format!("Order #{} placed.", receipt.order.id);
    for line in &receipt.lines {
        let _ = write!(out, "\n  {}", cart_line(line));
    }
    let _ = write!(
        out,
        "\nTotal {} paid by {}",
        receipt.total,
        receipt.payment_method.label()
    );
    out
}

#[must_use]
pub fn order_summary(order: &Order) -> String {
    let date = order
        .order_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
    let total = order
        .total_amount
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    let status = order
        .status
        .map_or_else(|| "-".to_string(), |s| s.to_string());

    let mut out = format!(
        "Order #{}  {date}  {total}  {status}  ({} units)",
        order.id,
        order.unit_count()
    );
    for item in &order.items {
        let name = item
            .product
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("(deleted product)");
        let _ = write!(out, "\n  {name} x {} @ {}", item.quantity, item.price);
    }
    out
}

#[must_use]
pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.".to_string();
    }
    orders
        .iter()
        .map(order_summary)
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn profile(user: &UserProfile) -> String {
    format!("{} <{}> (#{}, {})", user.name, user.email, user.id, user.role)
}

#[must_use]
pub fn statistics(stats: &StoreStatistics) -> String {
    let mut out = format!(
        "Products:     {}\nTotal sales:  {}\nStock status: {}",
        stats.total_products, stats.total_sales, stats.stock_status
    );
    if stats.needs_restock() {
        let _ = write!(
            out,
            "\n{} product(s) at or below {LOW_STOCK_THRESHOLD} units",
            stats.low_stock_count
        );
    }
    out
}
