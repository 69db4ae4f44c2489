//! Product reviews.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use nexuskart_core::ReviewId;

use super::ValidationError;
use super::null_as_default;

/// A review attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: Option<ReviewId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
    pub rating: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Body of `POST /product/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
}

impl ReviewInput {
    /// Check rating bounds and required text.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        if self.user_name.trim().is_empty() {
            return Err(ValidationError::Required("user name"));
        }
        if self.comment.trim().is_empty() {
            return Err(ValidationError::Required("comment"));
        }
        Ok(())
    }
}

/// Mean rating of a set of reviews, `None` when there are none.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // review counts stay far below f64 precision
    let count = reviews.len() as f64;
    Some(f64::from(sum) / count)
}
