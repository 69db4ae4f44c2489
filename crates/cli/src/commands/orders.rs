//! Order history.

use nexuskart_storefront::api::StorefrontClient;
use nexuskart_storefront::error::Result;

use crate::output;

/// The signed-in user's orders, or every order with `all` (admin only).
pub async fn list(client: &StorefrontClient, all: bool) -> Result<()> {
    let mut orders = if all {
        client.all_orders().await?
    } else {
        client.my_orders().await?
    };
    // Newest first; orders without a date sort last.
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
    output::print(&output::orders(&orders));
    Ok(())
}
