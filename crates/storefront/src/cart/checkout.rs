//! Turning a cart into a placed order.
//!
//! Checkout is sequential: one stock update per line, in cart order, each
//! awaited before the next, then the order itself. The first failure stops
//! everything and the cart keeps all of its lines. Stock updates that were
//! already accepted are not undone.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use nexuskart_core::{Money, OrderId, PaymentMethod, ProductId};

use super::{CartLine, CartStore};
use crate::api::ApiError;
use crate::models::order::DEFAULT_SHIPPING_ADDRESS;
use crate::models::{Order, OrderItemRequest, OrderRequest, Product, ProductRef};

/// The remote calls checkout makes.
///
/// Implemented by [`StorefrontClient`](crate::api::StorefrontClient).
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Write `product` back with its stock lowered by `quantity`.
    async fn decrement_stock(&self, product: &Product, quantity: u32) -> Result<(), ApiError>;

    /// Create the order record.
    async fn place_order(&self, order: &OrderRequest) -> Result<Order, ApiError>;
}

/// Where a cart is in its checkout lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    /// Remote calls are in flight. Seen after the fact only if the checkout
    /// future was dropped, in which case the remote outcome is unknown.
    CheckingOut,
    Completed {
        order_id: OrderId,
    },
    Failed,
}

/// Choices the shopper makes at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            payment_method: PaymentMethod::default(),
            shipping_address: DEFAULT_SHIPPING_ADDRESS.to_string(),
        }
    }
}

/// What a successful checkout bought.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub total: Money,
    pub payment_method: PaymentMethod,
    /// The lines that were in the cart.
    pub lines: Vec<CartLine>,
}

/// Why a checkout stopped. The cart is unchanged in every case.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    /// A stock update was rejected; no order was placed.
    #[error("Could not reserve stock for product {product_id}: {source}")]
    StockUpdate {
        product_id: ProductId,
        /// Products whose stock had already been lowered.
        decremented: Vec<ProductId>,
        #[source]
        source: ApiError,
    },

    /// All stock updates went through but the order was not created.
    #[error("Could not place order: {source}")]
    PlaceOrder {
        decremented: Vec<ProductId>,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    /// Products whose remote stock was lowered before the failure.
    #[must_use]
    pub fn decremented(&self) -> &[ProductId] {
        match self {
            Self::EmptyCart => &[],
            Self::StockUpdate { decremented, .. } | Self::PlaceOrder { decremented, .. } => {
                decremented
            }
        }
    }

    /// Whether the backend is left with stock lowered for an order that does
    /// not exist.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.decremented().is_empty()
    }

    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::EmptyCart => None,
            Self::StockUpdate { source, .. } | Self::PlaceOrder { source, .. } => Some(source),
        }
    }
}

pub type CheckoutResult = Result<CheckoutReceipt, CheckoutError>;

impl CartStore {
    /// The order body for the current lines.
    #[must_use]
    pub fn order_request(&self, options: &CheckoutOptions) -> OrderRequest {
        OrderRequest {
            total_amount: self.total(),
            payment_method: options.payment_method,
            shipping_address: options.shipping_address.clone(),
            items: self
                .lines
                .iter()
                .map(|line| OrderItemRequest {
                    product: ProductRef {
                        id: line.product_id(),
                    },
                    quantity: line.quantity(),
                    price: line.unit_price(),
                })
                .collect(),
        }
    }

    /// Lower remote stock for every line, then place the order.
    ///
    /// On success the cart is emptied and the receipt returned. Price and
    /// availability are not re-checked against the backend first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` without any remote call for an
    /// empty cart. Otherwise returns the first remote failure, listing the
    /// products whose stock was already lowered. Nothing is retried.
    #[instrument(skip_all, fields(lines = self.lines.len(), total = %self.total()))]
    pub async fn checkout<B>(&mut self, backend: &B, options: &CheckoutOptions) -> CheckoutResult
    where
        B: CheckoutBackend + ?Sized,
    {
        if self.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.phase = CheckoutPhase::CheckingOut;
        let order = self.order_request(options);
        let mut decremented = Vec::with_capacity(self.lines.len());

        for line in &self.lines {
            if let Err(source) = backend
                .decrement_stock(line.product(), line.quantity())
                .await
            {
                warn!(
                    product_id = %line.product_id(),
                    already_decremented = decremented.len(),
                    error = %source,
                    "Checkout stopped at stock update"
                );
                self.phase = CheckoutPhase::Failed;
                return Err(CheckoutError::StockUpdate {
                    product_id: line.product_id(),
                    decremented,
                    source,
                });
            }
            decremented.push(line.product_id());
        }

        let placed = match backend.place_order(&order).await {
            Ok(placed) => placed,
            Err(source) => {
                warn!(
                    already_decremented = decremented.len(),
                    error = %source,
                    "Checkout stopped at order placement"
                );
                self.phase = CheckoutPhase::Failed;
                return Err(CheckoutError::PlaceOrder {
                    decremented,
                    source,
                });
            }
        };

        let lines = std::mem::take(&mut self.lines);
        self.phase = CheckoutPhase::Completed { order_id: placed.id };
        info!(order_id = %placed.id, "Checkout completed");

        Ok(CheckoutReceipt {
            order: placed,
            total: order.total_amount,
            payment_method: order.payment_method,
            lines,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::api::AuthError;
    use crate::cart::tests::product;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Decrement { id: ProductId, quantity: u32, stock: u32 },
        PlaceOrder(OrderRequest),
    }

    /// Records every call and fails where told to.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Call>>,
        fail_decrement: Option<ProductId>,
        fail_order: bool,
        missing_session: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn order_posts(&self) -> Vec<OrderRequest> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::PlaceOrder(order) => Some(order),
                    Call::Decrement { .. } => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl CheckoutBackend for RecordingBackend {
        async fn decrement_stock(&self, product: &Product, quantity: u32) -> Result<(), ApiError> {
            if self.missing_session {
                return Err(AuthError::NotLoggedIn.into());
            }
            self.calls.lock().unwrap().push(Call::Decrement {
                id: product.id,
                quantity,
                stock: product.stock_quantity,
            });
            if self.fail_decrement == Some(product.id) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "Failed to update".to_string(),
                });
            }
            Ok(())
        }

        async fn place_order(&self, order: &OrderRequest) -> Result<Order, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::PlaceOrder(order.clone()));
            if self.fail_order {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(serde_json::from_value(json!({"id": 77, "status": "COMPLETED"})).unwrap())
        }
    }

    fn cart_with(items: &[(i64, i64, u32, u32)]) -> CartStore {
        let mut cart = CartStore::new();
        for &(id, price, stock, qty) in items {
            let p = product(id, price, stock);
            cart.add(&p).unwrap();
            cart.set_quantity(p.id, i64::from(qty) - 1);
        }
        cart
    }

    #[tokio::test]
    async fn test_checkout_success_empties_cart_and_posts_order() {
        let mut cart = cart_with(&[(1, 500, 4, 1)]);
        let backend = RecordingBackend::default();

        let receipt = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(
            cart.phase(),
            &CheckoutPhase::Completed {
                order_id: OrderId::new(77)
            }
        );
        assert_eq!(receipt.total, Money::from_major(500));
        assert_eq!(receipt.lines.len(), 1);

        let orders = backend.order_posts();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total_amount, Money::from_major(500));
        assert_eq!(orders[0].payment_method, PaymentMethod::Upi);
        assert_eq!(orders[0].shipping_address, DEFAULT_SHIPPING_ADDRESS);
    }

    #[tokio::test]
    async fn test_checkout_decrements_in_cart_order_before_ordering() {
        let mut cart = cart_with(&[(3, 100, 5, 2), (1, 200, 9, 4), (2, 50, 1, 1)]);
        let backend = RecordingBackend::default();
        let options = CheckoutOptions {
            payment_method: PaymentMethod::Cod,
            ..CheckoutOptions::default()
        };

        cart.checkout(&backend, &options).await.unwrap();

        let calls = backend.calls();
        assert_eq!(
            &calls[..3],
            &[
                Call::Decrement {
                    id: ProductId::new(3),
                    quantity: 2,
                    stock: 5
                },
                Call::Decrement {
                    id: ProductId::new(1),
                    quantity: 4,
                    stock: 9
                },
                Call::Decrement {
                    id: ProductId::new(2),
                    quantity: 1,
                    stock: 1
                },
            ]
        );
        match &calls[3] {
            Call::PlaceOrder(order) => {
                assert_eq!(order.total_amount, Money::from_major(1050));
                assert_eq!(order.payment_method, PaymentMethod::Cod);
                assert_eq!(order.items.len(), 3);
                assert_eq!(order.items[1].quantity, 4);
            }
            other => panic!("expected order post, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_decrement_failure_keeps_cart_and_skips_order() {
        let mut cart = cart_with(&[(1, 500, 4, 2), (2, 100, 3, 1)]);
        let before = cart.snapshot();
        let backend = RecordingBackend {
            fail_decrement: Some(ProductId::new(1)),
            ..RecordingBackend::default()
        };

        let err = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::StockUpdate { .. }));
        assert!(!err.is_partial());
        assert_eq!(cart.snapshot(), before);
        assert_eq!(cart.phase(), &CheckoutPhase::Failed);
        assert!(backend.order_posts().is_empty());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_later_decrement_failure_reports_partial_progress() {
        let mut cart = cart_with(&[(1, 500, 4, 1), (2, 100, 3, 1), (3, 10, 3, 1)]);
        let before = cart.snapshot();
        let backend = RecordingBackend {
            fail_decrement: Some(ProductId::new(2)),
            ..RecordingBackend::default()
        };

        let err = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.decremented(), &[ProductId::new(1)]);
        assert!(err.is_partial());
        assert_eq!(cart.snapshot(), before);
        assert!(backend.order_posts().is_empty());
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_order_failure_keeps_cart() {
        let mut cart = cart_with(&[(1, 500, 4, 1)]);
        let before = cart.snapshot();
        let backend = RecordingBackend {
            fail_order: true,
            ..RecordingBackend::default()
        };

        let err = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PlaceOrder { .. }));
        assert_eq!(err.decremented(), &[ProductId::new(1)]);
        assert_eq!(cart.snapshot(), before);
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_calls() {
        let mut cart = CartStore::new();
        let backend = RecordingBackend::default();

        let err = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(backend.calls().is_empty());
        assert_eq!(cart.phase(), &CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_session_surfaces_auth_error() {
        let mut cart = cart_with(&[(1, 500, 4, 1)]);
        let backend = RecordingBackend {
            missing_session: true,
            ..RecordingBackend::default()
        };

        let err = cart
            .checkout(&backend, &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.api_error(),
            Some(ApiError::Auth(AuthError::NotLoggedIn))
        ));
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_mutation_after_failure_resets_phase() {
        let mut cart = cart_with(&[(1, 500, 4, 1)]);
        let backend = RecordingBackend {
            fail_order: true,
            ..RecordingBackend::default()
        };
        let _ = cart.checkout(&backend, &CheckoutOptions::default()).await;
        assert_eq!(cart.phase(), &CheckoutPhase::Failed);

        cart.set_quantity(ProductId::new(1), 1);
        assert_eq!(cart.phase(), &CheckoutPhase::Idle);
    }
}
