//! Integration tests for the NexusKart storefront client.
//!
//! Every test runs the real [`StorefrontClient`] against an `httpmock`
//! server standing in for the REST backend, so no running store is needed.
//!
//! ```bash
//! cargo test -p nexuskart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - cart checkout: stock decrements then the order
//! - `auth_flow` - login, session persistence and access checks
//! - `catalog_sync` - browsing and reconciling the cart with the catalog

use std::path::PathBuf;

use httpmock::MockServer;
use serde_json::{Value, json};

use nexuskart_core::{Email, UserId, UserRole};
use nexuskart_storefront::api::StorefrontClient;
use nexuskart_storefront::config::{ApiConfig, ClientConfig};
use nexuskart_storefront::models::{Product, UserProfile};
use nexuskart_storefront::session::Session;

/// Bearer token handed out by [`signed_in_client`].
pub const TEST_TOKEN: &str = "test-token";

/// Client configuration pointing at the mock server's `/api` prefix.
///
/// The session file goes to a fresh temporary directory.
#[must_use]
pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api: ApiConfig::with_base_url(&server.url("/api")).expect("mock server URL is valid"),
        session_path: temp_session_path(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

#[must_use]
pub fn temp_session_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("nexuskart-it-{}", uuid::Uuid::new_v4()))
        .join("session.json")
}

/// An anonymous client for `server`.
#[must_use]
pub fn client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::new(&client_config(server).api).expect("client builds")
}

#[must_use]
pub fn profile(role: UserRole) -> UserProfile {
    UserProfile {
        id: UserId::new(7),
        email: Email::parse("shopper@example.com").expect("valid email"),
        name: "Shopper".to_string(),
        role,
    }
}

/// A client already holding a session for [`profile`].
pub async fn signed_in_client(server: &MockServer, role: UserRole) -> StorefrontClient {
    let client = client(server);
    client
        .set_session(Some(Session::new(profile(role), TEST_TOKEN.to_string())))
        .await;
    client
}

/// Backend JSON for a product.
#[must_use]
pub fn product_json(id: i64, price: i64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "description": "A product",
        "brand": "Acme",
        "price": price,
        "category": "Laptop",
        "releaseDate": "2024-05-01",
        "productAvailable": true,
        "stockQuantity": stock,
        "imageName": format!("p{id}.png"),
        "imageType": "image/png"
    })
}

#[must_use]
pub fn product(id: i64, price: i64, stock: u32) -> Product {
    serde_json::from_value(product_json(id, price, stock)).expect("product JSON matches model")
}
