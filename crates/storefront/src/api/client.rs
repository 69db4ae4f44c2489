//! HTTP plumbing shared by every endpoint group.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, StatusCode, multipart};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, AuthError, error_message};
use crate::config::ApiConfig;
use crate::models::{ImageData, ImageUpload, UserProfile};
use crate::session::Session;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Credentials an endpoint needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// Token attached when a live session exists, never required.
    Public,
    /// Any signed-in user.
    User,
    /// A signed-in user with the admin role.
    Admin,
}

pub(crate) enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(multipart::Form),
}

/// Client for the NexusKart REST backend.
///
/// Holds the signed-in session, if any, and attaches its bearer token to
/// every request. Product details and images are cached for the configured
/// TTL.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: RwLock<Option<Arc<Session>>>,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("nexuskart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                base_url: config.base_url.clone(),
                session: RwLock::new(None),
                cache,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The current session, expired or not.
    pub async fn session(&self) -> Option<Arc<Session>> {
        self.inner.session.read().await.clone()
    }

    /// Replace the current session (login, logout, restore from disk).
    pub async fn set_session(&self, session: Option<Session>) {
        *self.inner.session.write().await = session.map(Arc::new);
    }

    /// Take the session out of the client, leaving it signed out.
    pub async fn take_session(&self) -> Option<Arc<Session>> {
        self.inner.session.write().await.take()
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` or `AuthError::SessionExpired`.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let session = self.credentials(Access::User).await?;
        session
            .map(|s| s.user().clone())
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }

    async fn credentials(&self, access: Access) -> Result<Option<Arc<Session>>, AuthError> {
        let session = self.session().await;
        match access {
            Access::Public => Ok(session.filter(|s| !s.is_expired())),
            Access::User | Access::Admin => {
                let session = session.ok_or(AuthError::NotLoggedIn)?;
                if session.is_expired() {
                    return Err(AuthError::SessionExpired);
                }
                if access == Access::Admin && !session.user().is_admin() {
                    return Err(AuthError::Forbidden("admin role required".to_string()));
                }
                Ok(Some(session))
            }
        }
    }

    // =========================================================================
    // Request execution
    // =========================================================================

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and map non-success statuses to [`ApiError`].
    #[instrument(
        skip(self, url, body),
        fields(method = %method, path = %url.path(), request_id = tracing::field::Empty)
    )]
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        access: Access,
        body: Body,
    ) -> Result<reqwest::Response, ApiError> {
        let session = self.credentials(access).await?;

        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(session) = &session {
            request = request.bearer_auth(session.token().expose_secret());
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "Request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Request succeeded");
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text, status);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            warn!(status = %status, message = %message, "Backend rejected request");
        }

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(message)
            }
            StatusCode::UNAUTHORIZED => AuthError::Unauthorized(message).into(),
            StatusCode::FORBIDDEN => AuthError::Forbidden(message).into(),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send a request and parse the JSON body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        access: Access,
        body: Body,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, url, access, body).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body is plain text.
    pub(crate) async fn execute_text(
        &self,
        method: Method,
        url: Url,
        access: Access,
        body: Body,
    ) -> Result<String, ApiError> {
        let response = self.execute(method, url, access, body).await?;
        Ok(response.text().await?)
    }

    /// Send a request whose response body is raw image bytes.
    pub(crate) async fn execute_image(&self, url: Url, access: Access) -> Result<ImageData, ApiError> {
        let response = self.execute(Method::GET, url, access, Body::Empty).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(ImageData {
            content_type,
            bytes,
        })
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    pub(crate) async fn cache_get(&self, key: CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(&key).await
    }

    pub(crate) async fn cache_insert(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    pub(crate) async fn cache_invalidate(&self, key: CacheKey) {
        self.inner.cache.invalidate(&key).await;
    }

    /// Invalidate a cached product and its image.
    pub async fn invalidate_product(&self, id: nexuskart_core::ProductId) {
        self.inner.cache.invalidate(&CacheKey::Product(id)).await;
        self.inner.cache.invalidate(&CacheKey::ProductImage(id)).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Multipart body for `POST /product` and `PUT /product/{id}`.
///
/// Without an image part the backend keeps the stored image.
pub(crate) fn product_form<T: Serialize>(
    product: &T,
    image: Option<&ImageUpload>,
) -> Result<multipart::Form, ApiError> {
    let json = serde_json::to_string(product)?;
    let mut form = multipart::Form::new().part(
        "product",
        multipart::Part::text(json).mime_str("application/json")?,
    );
    if let Some(image) = image {
        form = form.part("imageFile", image_part(image)?);
    }
    Ok(form)
}

pub(crate) fn image_part(image: &ImageUpload) -> Result<multipart::Part, ApiError> {
    Ok(multipart::Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexuskart_core::{Email, UserId, UserRole};

    use super::*;

    fn client() -> StorefrontClient {
        StorefrontClient::new(&ApiConfig::with_base_url("http://localhost:8085/api").unwrap())
            .unwrap()
    }

    fn user(role: UserRole) -> UserProfile {
        UserProfile {
            id: UserId::new(1),
            email: Email::parse("a@b.in").unwrap(),
            name: "A".to_string(),
            role,
        }
    }

    #[test]
    fn test_endpoint_joins_under_api_base() {
        let url = client().endpoint("product/5/image").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8085/api/product/5/image");
    }

    #[tokio::test]
    async fn test_credentials_require_session() {
        let client = client();
        assert!(client.credentials(Access::Public).await.unwrap().is_none());
        assert_eq!(
            client.credentials(Access::User).await.unwrap_err(),
            AuthError::NotLoggedIn
        );
    }

    #[tokio::test]
    async fn test_credentials_admin_role() {
        let client = client();
        client
            .set_session(Some(Session::new(user(UserRole::User), "t".to_string())))
            .await;
        assert!(client.credentials(Access::User).await.unwrap().is_some());
        assert!(matches!(
            client.credentials(Access::Admin).await.unwrap_err(),
            AuthError::Forbidden(_)
        ));

        client
            .set_session(Some(Session::new(user(UserRole::Admin), "t".to_string())))
            .await;
        assert!(client.credentials(Access::Admin).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_not_sent() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1000}"#);
        let token = format!("h.{payload}.s");
        let client = client();
        client
            .set_session(Some(Session::new(user(UserRole::User), token)))
            .await;

        assert_eq!(
            client.credentials(Access::User).await.unwrap_err(),
            AuthError::SessionExpired
        );
        assert!(client.credentials(Access::Public).await.unwrap().is_none());
    }

    #[test]
    fn test_product_form_builds_with_and_without_image() {
        let image = ImageUpload {
            file_name: "p.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50],
        };
        let value = serde_json::json!({"id": 1});
        assert!(product_form(&value, None).is_ok());
        assert!(product_form(&value, Some(&image)).is_ok());
    }
}
