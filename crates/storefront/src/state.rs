//! Application state shared by front-end commands.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::StorefrontClient;
use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::session::{PersistedState, SessionStore};

/// Application state: configuration, the backend client and the session
/// file.
///
/// This struct is cheaply cloneable via `Arc`. The cart is not part of it;
/// it is restored as an owned [`CartStore`] and handed back to
/// [`AppState::persist`] when the command is done with it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    client: StorefrontClient,
    sessions: SessionStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = StorefrontClient::new(&config.api)?;
        let sessions = SessionStore::new(config.session_path.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                sessions,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &StorefrontClient {
        &self.inner.client
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Load the saved session into the client and rebuild the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read.
    pub async fn restore(&self) -> Result<CartStore, AppError> {
        let PersistedState { session, cart } = self.inner.sessions.load().await?;

        if let Some(session) = &session {
            if session.is_expired() {
                warn!(user_id = %session.user().id, "Saved session has expired");
            }
            set_sentry_user(&session.user().id, Some(session.user().email.as_str()));
        }
        self.inner.client.set_session(session).await;

        let cart = CartStore::from_snapshot(cart);
        if !cart.is_empty() {
            info!(lines = cart.len(), "Restored cart");
        }
        Ok(cart)
    }

    /// Save the client's session and `cart` for the next command.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub async fn persist(&self, cart: &CartStore) -> Result<(), AppError> {
        let session = self.inner.client.session().await;
        if session.is_none() {
            clear_sentry_user();
        }

        let state = PersistedState {
            session: session.as_deref().cloned(),
            cart: cart.snapshot(),
        };
        self.inner.sessions.save(&state).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use nexuskart_core::{Email, UserId, UserRole};
    use serde_json::json;

    use super::*;
    use crate::config::ApiConfig;
    use crate::models::{Product, UserProfile};
    use crate::session::Session;

    fn config() -> ClientConfig {
        let mut api = ApiConfig::with_base_url("http://localhost:8085/api").unwrap();
        api.request_timeout = Duration::from_secs(2);
        ClientConfig {
            api,
            session_path: std::env::temp_dir()
                .join(format!("nexuskart-state-{}", uuid::Uuid::new_v4()))
                .join("session.json"),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[tokio::test]
    async fn test_persist_then_restore_round_trips_cart_and_session() {
        let config = config();
        let dir = config.session_path.parent().unwrap().to_path_buf();

        let state = AppState::new(config.clone()).unwrap();
        state
            .client()
            .set_session(Some(Session::new(
                UserProfile {
                    id: UserId::new(8),
                    email: Email::parse("meera@example.com").unwrap(),
                    name: "Meera".to_string(),
                    role: UserRole::User,
                },
                "tok".to_string(),
            )))
            .await;

        let product: Product = serde_json::from_value(json!({
            "id": 1, "name": "Mouse", "description": "d", "brand": "b",
            "price": 799, "category": "Electronics",
            "productAvailable": true, "stockQuantity": 3
        }))
        .unwrap();
        let mut cart = CartStore::new();
        cart.add(&product).unwrap();
        cart.add(&product).unwrap();
        state.persist(&cart).await.unwrap();

        let fresh = AppState::new(config).unwrap();
        let restored = fresh.restore().await.unwrap();
        assert_eq!(restored.item_count(), 2);
        assert_eq!(restored.total(), cart.total());
        assert_eq!(
            fresh.client().session().await.unwrap().user().id,
            UserId::new(8)
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
