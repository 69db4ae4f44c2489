//! Sign-in, signup and profile commands.

use std::path::Path;

use secrecy::SecretString;

use nexuskart_core::{Email, UserId};
use nexuskart_storefront::api::{ProfileUpdate, SignupRequest, StorefrontClient};
use nexuskart_storefront::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use nexuskart_storefront::models::ImageUpload;

use crate::output;

pub async fn login(client: &StorefrontClient, email: &str, password: String) -> Result<()> {
    let email = Email::parse(email)?;
    let user = client.login(&email, &SecretString::from(password)).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    output::print(&format!("Welcome back, {}.", user.name));
    Ok(())
}

pub async fn signup(
    client: &StorefrontClient,
    name: String,
    email: &str,
    password: String,
    admin_code: Option<String>,
) -> Result<()> {
    let request = SignupRequest {
        name,
        email: Email::parse(email)?,
        password: SecretString::from(password),
        admin_code: admin_code
            .filter(|code| !code.trim().is_empty())
            .map(SecretString::from),
    };
    let user = client.signup(&request).await?;

    output::print(&format!(
        "Account created for {}. Sign in with `nexuskart login -e {}`.",
        output::profile(&user),
        user.email
    ));
    Ok(())
}

pub async fn logout(client: &StorefrontClient) {
    if client.logout().await {
        clear_sentry_user();
        output::print("Signed out.");
    } else {
        output::print("You were not signed in.");
    }
}

pub async fn whoami(client: &StorefrontClient) -> Result<()> {
    let user = client.current_user().await?;
    output::print(&output::profile(&user));
    Ok(())
}

/// Update the profile; fields left out keep their current value.
pub async fn update_profile(
    client: &StorefrontClient,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let current = client.current_user().await?;
    let update = ProfileUpdate {
        name: name.unwrap_or(current.name),
        email: email.as_deref().map(Email::parse).transpose()?.unwrap_or(current.email),
        password: password.map(SecretString::from),
    };
    let user = client.update_profile(&update).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    output::print(&format!("Profile updated: {}", output::profile(&user)));
    Ok(())
}

pub async fn upload_picture(client: &StorefrontClient, path: &Path) -> Result<()> {
    let image = ImageUpload::from_path(path).await?;
    client.upload_profile_picture(&image).await?;
    output::print("Profile picture updated.");
    Ok(())
}

pub async fn download_picture(
    client: &StorefrontClient,
    user: Option<UserId>,
    out: &Path,
) -> Result<()> {
    let user = match user {
        Some(id) => id,
        None => client.current_user().await?.id,
    };

    match client.profile_picture(user).await? {
        Some(image) => {
            super::save_image(&image, out).await?;
            output::print(&format!("Saved profile picture to {}", out.display()));
        }
        None => output::print("No profile picture set."),
    }
    Ok(())
}

pub async fn newsletter(client: &StorefrontClient, email: &str) -> Result<()> {
    let email = Email::parse(email)?;
    let message = client.subscribe_newsletter(&email).await?;
    output::print(&message);
    Ok(())
}
