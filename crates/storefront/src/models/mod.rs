//! Wire models for the NexusKart REST backend.
//!
//! The backend is a Spring application that serializes entities with
//! camelCase keys and happily emits `null` for unset collections and strings,
//! so most collection fields go through [`null_as_default`].

pub mod order;
pub mod page;
pub mod product;
pub mod review;
pub mod stats;
pub mod user;

pub use order::{Order, OrderItem, OrderItemRequest, OrderRequest, OrderedProduct, ProductRef};
pub use page::{Page, ProductQuery};
pub use product::{ImageData, ImageUpload, Product, ProductDraft, ValidationError};
pub use review::{Review, ReviewInput};
pub use stats::StoreStatistics;
pub use user::{LoginResponse, UserProfile};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be `null`, falling back to `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
