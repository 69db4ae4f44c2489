//! REST client for the NexusKart backend.
//!
//! # Architecture
//!
//! - One [`StorefrontClient`] per process, cheap to clone (`Arc` inside)
//! - The backend is the source of truth; product detail and image responses
//!   are cached in-memory via `moka` and invalidated on every write this
//!   client makes to a product
//! - Listing pages are never cached so stock and availability stay fresh
//!
//! # Endpoint groups
//!
//! - [`catalog`]: listings, search, detail, images, reviews
//! - [`account`]: login, signup, profile, newsletter
//! - [`orders`]: order placement, order history, checkout stock updates
//! - [`admin`]: product management and dashboard statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use nexuskart_storefront::api::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.api)?;
//! let page = client.list_products(&ProductQuery::default()).await?;
//! let product = client.get_product(page.content[0].id).await?;
//! ```

pub mod account;
pub mod admin;
mod cache;
pub mod catalog;
mod client;
pub mod orders;

pub use account::{ProfileUpdate, SignupRequest};
pub use client::StorefrontClient;

use thiserror::Error;

use crate::models::ValidationError;
use nexuskart_core::EmailError;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Input rejected, either locally or by the backend (HTTP 400/422).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Missing, expired or insufficient credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the request timed out rather than failing outright.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }

    /// Whether this is a fault on our side of the wire or the backend's,
    /// as opposed to a user mistake. These are worth reporting to Sentry.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Server { .. } | Self::Parse(_) | Self::Url(_)
        )
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Authentication and authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No session is stored.
    #[error("Please log in first")]
    NotLoggedIn,

    /// The stored token's expiry has passed.
    #[error("Your session has expired, please log in again")]
    SessionExpired,

    /// Login rejected the email/password pair.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The backend refused the token (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in, but not allowed to do this (HTTP 403 or a non-admin role).
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers with plain text (`"Email already exists"`), a Spring
/// error object, or a field-error map depending on the endpoint.
pub(crate) fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let body = body.trim();

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key)
                && !msg.trim().is_empty()
            {
                return msg.trim().to_string();
            }
        }
        let fields: Vec<String> = map
            .iter()
            .filter_map(|(field, v)| v.as_str().map(|msg| format!("{field}: {msg}")))
            .collect();
        if !fields.is_empty() {
            return fields.join("; ");
        }
    }

    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(
            error_message("Email already exists\n", StatusCode::BAD_REQUEST),
            "Email already exists"
        );
    }

    #[test]
    fn test_error_message_spring_error_object() {
        let body = r#"{"timestamp":"2025-03-01T10:00:00","status":404,"error":"Not Found","message":"","path":"/api/product/99"}"#;
        assert_eq!(error_message(body, StatusCode::NOT_FOUND), "Not Found");

        let body = r#"{"status":403,"error":"Forbidden","message":"Access Denied"}"#;
        assert_eq!(error_message(body, StatusCode::FORBIDDEN), "Access Denied");
    }

    #[test]
    fn test_error_message_field_map() {
        let body = r#"{"name":"must not be blank"}"#;
        assert_eq!(
            error_message(body, StatusCode::BAD_REQUEST),
            "name: must not be blank"
        );
    }

    #[test]
    fn test_error_message_empty_body_uses_reason() {
        assert_eq!(
            error_message("", StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_error_message_truncates() {
        let body = "x".repeat(1000);
        assert_eq!(error_message(&body, StatusCode::BAD_GATEWAY).len(), 200);
    }

    #[test]
    fn test_server_fault_classification() {
        assert!(
            ApiError::Server {
                status: 500,
                message: "boom".to_string()
            }
            .is_server_fault()
        );
        assert!(!ApiError::Validation("bad".to_string()).is_server_fault());
        assert!(!ApiError::Auth(AuthError::NotLoggedIn).is_server_fault());
    }
}
