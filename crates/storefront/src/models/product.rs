//! Catalog product records.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nexuskart_core::{Money, ProductId};

use super::null_as_default;

/// A listing failed client-side validation before being sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Required(&'static str),
    /// Price must be greater than zero.
    #[error("price must be greater than zero")]
    NonPositivePrice,
    /// Rating outside 1..=5.
    #[error("rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),
    /// Image file could not be read.
    #[error("image file {path}: {reason}")]
    Image {
        /// Path that was requested.
        path: String,
        /// Why it failed.
        reason: String,
    },
}

/// A product as stored by the backend.
///
/// Image bytes are never deserialized or re-sent: the backend keeps the
/// stored image when an update arrives without an `imageFile` part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    pub price: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_available: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock_quantity: u32,
    #[serde(default, skip_serializing)]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub image_type: Option<String>,
}

impl Product {
    /// Whether the product can be added to a cart right now.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.product_available && self.stock_quantity > 0
    }

    /// Copy of this record with a new stock level, as sent by checkout.
    #[must_use]
    pub fn with_stock(&self, stock_quantity: u32) -> Self {
        Self {
            stock_quantity,
            ..self.clone()
        }
    }

    /// Check the fields the backend validates on create and update.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_listing(
            &self.name,
            &self.description,
            &self.brand,
            &self.category,
            self.price,
        )
    }
}

/// A new product submitted from the admin back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub price: Money,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    pub product_available: bool,
    pub stock_quantity: u32,
}

impl ProductDraft {
    /// Check the fields the backend validates on create.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_listing(
            &self.name,
            &self.description,
            &self.brand,
            &self.category,
            self.price,
        )
    }
}

fn validate_listing(
    name: &str,
    description: &str,
    brand: &str,
    category: &str,
    price: Money,
) -> Result<(), ValidationError> {
    for (field, value) in [
        ("name", name),
        ("description", description),
        ("brand", brand),
        ("category", category),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required(field));
        }
    }
    if !price.is_positive() {
        return Err(ValidationError::NonPositivePrice);
    }
    Ok(())
}

/// Image bytes downloaded from a product or profile image endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// MIME type reported by the backend.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// An image file attached to a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, inferring its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Image` if the file cannot be read or the
    /// extension is not a supported image type.
    pub async fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let image_error = |reason: String| ValidationError::Image {
            path: path.display().to_string(),
            reason,
        };

        let content_type = content_type_for(path)
            .ok_or_else(|| image_error("unsupported image extension".to_string()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| image_error(e.to_string()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
