//! Data models for soundstore

pub mod category;
pub mod deal;
pub mod product;
pub mod rating;

pub use category::{Category, CategoryQuery, Pagination};
pub use deal::Deal;
pub use product::{CategoryRef, Product, ProductPage, ProductView};
pub use rating::{RatingRecord, RatingUpdate};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default
///
/// The backend emits `null` for blank text fields on older records.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
