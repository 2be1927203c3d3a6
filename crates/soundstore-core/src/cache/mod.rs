//! TTL-based product/deal cache
//!
//! [`ProductCache`] is the single read path for catalog data: it serves
//! fresh entries from memory, fetches stale ones through a [`CatalogApi`],
//! merges deals into products and keeps product ratings coherent through
//! the [`RatingSink`] port.
//!
//! [`CatalogApi`]: crate::api::CatalogApi

pub mod coherency;
pub mod entry;
pub mod merge;
pub mod store;

pub use coherency::{spawn_rating_listener, RatingSink};
pub use entry::{CacheEntry, CategoryBucket, EntryState, EntryStatus};
pub use merge::merge_deals;
pub use store::{CacheStatus, ProductCache};

use crate::models::Pagination;
use serde::Serialize;

/// Result of a cache-aware listing read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fetched<T> {
    pub data: Vec<T>,
    pub total_count: usize,
    /// Served from memory without a network call
    pub from_cache: bool,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Fetched<U> {
        Fetched {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            from_cache: self.from_cache,
        }
    }
}

/// Result of a cache-aware category page read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
    pub from_cache: bool,
}

impl<T> CategoryPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CategoryPage<U> {
        CategoryPage {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
            from_cache: self.from_cache,
        }
    }
}
