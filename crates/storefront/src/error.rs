//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that front ends surface as one
//! blocking message per failure. Faults on the backend or network side are
//! captured to Sentry first; user mistakes are not.

use sentry::integrations::tracing::EventFilter;
use thiserror::Error;

use nexuskart_core::EmailError;

use crate::api::{ApiError, AuthError};
use crate::cart::{CartError, CheckoutError};
use crate::config::ConfigError;
use crate::models::ValidationError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local cart operation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout stopped.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session file could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Input failed a local check.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Email address did not parse.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// A local file could not be read or written.
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the caller typed that made no sense.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::Api(ApiError::Auth(err))
    }
}

impl AppError {
    /// Whether this should be captured to Sentry.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        match self {
            Self::Api(err) => err.is_server_fault(),
            // A partial checkout leaves stock lowered without an order.
            Self::Checkout(err) => {
                err.is_partial() || err.api_error().is_some_and(ApiError::is_server_fault)
            }
            Self::Session(SessionError::Io { .. }) => true,
            _ => false,
        }
    }

    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => api_message(err),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => err.to_string(),
                CheckoutError::StockUpdate { source, .. } | CheckoutError::PlaceOrder { source, .. } => {
                    let mut message = format!("Checkout failed: {}", api_message(source));
                    if err.is_partial() {
                        message.push_str(
                            ". Stock was already reserved for some items; your cart has been kept",
                        );
                    } else {
                        message.push_str(". Your cart has been kept");
                    }
                    message
                }
            },
            Self::Cart(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Email(err) => format!("Invalid email address: {err}"),
            Self::Config(err) => format!("Configuration problem: {err}"),
            Self::Session(err) => err.to_string(),
            Self::Io(err) => format!("File error: {err}"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Capture to Sentry when reportable, log, and return the user message.
    pub fn report(&self) -> String {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::debug!(error = %self, "Command rejected");
        }
        self.user_message()
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(e) if e.is_timeout() => {
            "The store did not respond in time, please try again".to_string()
        }
        ApiError::Network(_) => "Could not reach the store, check your connection".to_string(),
        ApiError::Validation(msg) => msg.clone(),
        ApiError::Auth(auth) => auth.to_string(),
        ApiError::NotFound(_) => "Not found".to_string(),
        ApiError::RateLimited(secs) => format!("Too many requests, retry in {secs}s"),
        ApiError::Server { .. } | ApiError::Parse(_) | ApiError::Url(_) => {
            "The store had a problem handling that request".to_string()
        }
    }
}

/// Route tracing events into Sentry as breadcrumbs only.
///
/// [`AppError::report`] is the one place failures become Sentry events;
/// the warnings and errors logged on the way there ride along as the trail.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        tracing::Level::TRACE => EventFilter::Ignore,
        _ => EventFilter::Breadcrumb,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after login or session restore to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
