//! Orders: the placement request and the history records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use nexuskart_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId};

use super::null_as_default;

/// Shipping address sent with every order; the storefront has no address
/// form yet.
pub const DEFAULT_SHIPPING_ADDRESS: &str = "Default Shipping Address";

/// Body of `POST /orders/place`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub items: Vec<OrderItemRequest>,
}

/// One ordered line in an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemRequest {
    pub product: ProductRef,
    pub quantity: u32,
    pub price: Money,
}

/// Reference to a product by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
}

/// An order as returned by the history endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl Order {
    /// Number of units across all items.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One line of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub product: Option<OrderedProduct>,
    pub quantity: u32,
    pub price: Money,
}

/// The product summary embedded in an order item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderedProduct {
    pub id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accept either an ISO-8601 string or epoch milliseconds.
///
/// Jackson emits one or the other depending on the backend's
/// `WRITE_DATES_AS_TIMESTAMPS` setting.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Millis(ms)) => Ok(Utc.timestamp_millis_opt(ms).single()),
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_request_wire_format() {
        let request = OrderRequest {
            total_amount: Money::from_major(500),
            payment_method: PaymentMethod::Upi,
            shipping_address: DEFAULT_SHIPPING_ADDRESS.to_string(),
            items: vec![OrderItemRequest {
                product: ProductRef {
                    id: ProductId::new(1),
                },
                quantity: 1,
                price: Money::from_major(500),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["paymentMethod"], "upi");
        assert_eq!(value["shippingAddress"], DEFAULT_SHIPPING_ADDRESS);
        assert_eq!(value["items"][0]["product"]["id"], 1);
        assert_eq!(value["items"][0]["quantity"], 1);
        assert!((value["totalAmount"].as_f64().unwrap() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_with_iso_date() {
        let order: Order = serde_json::from_value(json!({
            "id": 12,
            "user": {"id": 3, "email": "a@b.com"},
            "orderDate": "2025-03-01T10:15:30.000+00:00",
            "totalAmount": 1500.0,
            "status": "COMPLETED",
            "items": [
                {"id": 1, "product": {"id": 4, "name": "Mouse"}, "quantity": 2, "price": 500},
                {"id": 2, "product": {"id": 5, "name": "Pad"}, "quantity": 1, "price": 500}
            ],
            "shippingAddress": "Default Shipping Address",
            "paymentMethod": "cod"
        }))
        .unwrap();

        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, Some(OrderStatus::Completed));
        assert_eq!(order.payment_method, Some(PaymentMethod::Cod));
        assert_eq!(order.unit_count(), 3);
        assert_eq!(
            order.order_date.unwrap().to_rfc3339(),
            "2025-03-01T10:15:30+00:00"
        );
    }

    #[test]
    fn test_order_with_epoch_date_and_null_items() {
        let order: Order = serde_json::from_value(json!({
            "id": 1,
            "orderDate": 1_700_000_000_000_i64,
            "items": null
        }))
        .unwrap();
        assert_eq!(order.order_date.unwrap().timestamp(), 1_700_000_000);
        assert!(order.items.is_empty());
        assert_eq!(order.total_amount, None);
    }

    #[test]
    fn test_order_with_bad_date_fails() {
        let result: Result<Order, _> = serde_json::from_value(json!({
            "id": 1,
            "orderDate": "yesterday"
        }));
        assert!(result.is_err());
    }
}
