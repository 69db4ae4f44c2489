//! Admin dashboard statistics.

use serde::Deserialize;

use nexuskart_core::Money;

/// Response of `GET /statistics`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatistics {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_sales: Money,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub low_stock_count: u64,
}

impl StoreStatistics {
    /// Whether any product is at or below the low-stock threshold.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.low_stock_count > 0
    }
}
