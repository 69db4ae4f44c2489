//! Identity endpoints: login, signup, profile and newsletter.

use reqwest::Method;
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use nexuskart_core::{Email, UserId};

use super::client::{Access, Body, StorefrontClient, image_part};
use super::{ApiError, AuthError};
use crate::models::{ImageData, ImageUpload, LoginResponse, UserProfile};
use crate::session::Session;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Body of `POST /auth/signup`.
///
/// An admin code matching the backend's configured secret grants the admin
/// role; anything else creates a regular user.
#[derive(Debug)]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub admin_code: Option<SecretString>,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }
        validate_password(&self.password)
    }
}

/// Body of `PUT /auth/profile/{id}`.
///
/// The password is only changed when one is given.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: Email,
    pub password: Option<SecretString>,
}

fn validate_password(password: &SecretString) -> Result<(), ApiError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct NewsletterResponse {
    message: String,
}

impl StorefrontClient {
    /// Sign in and keep the returned session on this client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the backend rejects the
    /// pair, or an error if the API request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("auth/login")?;
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });

        let response: LoginResponse = self
            .execute_json(Method::POST, url, Access::Public, Body::Json(body))
            .await
            .map_err(|e| match e {
                ApiError::Auth(AuthError::Unauthorized(_)) => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        let (user, token) = response.into_parts();
        info!(user_id = %user.id, role = %user.role, "Signed in");
        self.set_session(Some(Session::new(user.clone(), token)))
            .await;

        Ok(user)
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, a short password or an
    /// email that is already registered.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserProfile, ApiError> {
        request.validate()?;

        let url = self.endpoint("auth/signup")?;
        let mut body = json!({
            "name": request.name.trim(),
            "email": request.email.as_str(),
            "password": request.password.expose_secret(),
        });
        if let Some(code) = &request.admin_code {
            body["adminCode"] = json!(code.expose_secret());
        }

        let user: UserProfile = self
            .execute_json(Method::POST, url, Access::Public, Body::Json(body))
            .await?;
        info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Drop the session. Returns whether one existed.
    pub async fn logout(&self) -> bool {
        let had_session = self.take_session().await.is_some();
        if had_session {
            info!("Signed out");
        }
        had_session
    }

    /// Update the signed-in user's name, email and optionally password.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is signed in, the new password is too
    /// short, or the API request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        if update.name.trim().is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }
        if let Some(password) = &update.password {
            validate_password(password)?;
        }

        let current = self.current_user().await?;
        let url = self.endpoint(&format!("auth/profile/{}", current.id))?;
        let mut body = json!({
            "name": update.name.trim(),
            "email": update.email.as_str(),
        });
        if let Some(password) = &update.password {
            body["password"] = json!(password.expose_secret());
        }

        let user: UserProfile = self
            .execute_json(Method::PUT, url, Access::User, Body::Json(body))
            .await?;

        if let Some(session) = self.session().await {
            self.set_session(Some(session.with_user(user.clone()))).await;
        }
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Upload a new profile picture for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is signed in or the API request fails.
    #[instrument(skip(self, image), fields(file = %image.file_name))]
    pub async fn upload_profile_picture(&self, image: &ImageUpload) -> Result<(), ApiError> {
        let current = self.current_user().await?;
        let url = self.endpoint(&format!("users/{}/image", current.id))?;
        let form = multipart::Form::new().part("imageFile", image_part(image)?);

        self.execute_text(Method::POST, url, Access::User, Body::Multipart(form))
            .await?;
        Ok(())
    }

    /// Download a user's profile picture, `None` if they have not set one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn profile_picture(&self, user: UserId) -> Result<Option<ImageData>, ApiError> {
        let url = self.endpoint(&format!("users/{user}/image"))?;
        match self.execute_image(url, Access::User).await {
            Ok(image) => Ok(Some(image)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Subscribe an address to the newsletter. Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn subscribe_newsletter(&self, email: &Email) -> Result<String, ApiError> {
        let url = self.endpoint("newsletter/subscribe")?;
        let body = json!({ "email": email.as_str() });
        let response: NewsletterResponse = self
            .execute_json(Method::POST, url, Access::Public, Body::Json(body))
            .await?;
        Ok(response.message)
    }
}
