//! Status and selection enums shared by the client and the CLI.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as recorded by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Payment method chosen at checkout.
///
/// Serialized in lowercase, matching the values the backend stores on the
/// order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// UPI transfer (default selection).
    #[default]
    Upi,
    /// Credit or debit card.
    Card,
    /// Net banking.
    NetBanking,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// Human-readable label for confirmations.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Card => "Credit / Debit Card",
            Self::NetBanking => "Net Banking",
            Self::Cod => "Cash on Delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upi => write!(f, "upi"),
            Self::Card => write!(f, "card"),
            Self::NetBanking => write!(f, "netbanking"),
            Self::Cod => write!(f, "cod"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "netbanking" | "net_banking" => Ok(Self::NetBanking),
            "cod" => Ok(Self::Cod),
            "emi" => Err("EMI is currently unavailable".to_string()),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Account role returned by the login endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Store administrator with back-office access.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "USER"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::NetBanking).unwrap(),
            "\"netbanking\""
        );
        let cod: PaymentMethod = serde_json::from_str("\"cod\"").unwrap();
        assert_eq!(cod, PaymentMethod::Cod);
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(
            "net_banking".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::NetBanking
        );
        assert_eq!(
            "emi".parse::<PaymentMethod>().unwrap_err(),
            "EMI is currently unavailable"
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(status.to_string(), "COMPLETED");
    }

    #[test]
    fn test_user_role_wire_format() {
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
