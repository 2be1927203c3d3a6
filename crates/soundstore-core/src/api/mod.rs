//! Catalog REST API boundary
//!
//! `CatalogApi` is the port the cache talks to; `HttpCatalogApi` is the
//! reqwest-backed implementation. All response-shape handling lives in
//! [`decode`], so callers only ever see typed pages or a decode error.

pub mod decode;
pub mod http;

pub use http::HttpCatalogApi;

use crate::error::Result;
use crate::models::{Category, CategoryQuery, Deal, ProductPage};
use async_trait::async_trait;

/// Listing calls the product cache depends on
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One page of the full product listing
    async fn fetch_products(&self, query: &CategoryQuery) -> Result<ProductPage>;

    /// All currently active deals
    async fn fetch_deals(&self) -> Result<Vec<Deal>>;

    /// One page of products in a category
    async fn fetch_category_products(
        &self,
        category_id: &str,
        query: &CategoryQuery,
    ) -> Result<ProductPage>;

    /// All browsable categories
    async fn fetch_categories(&self) -> Result<Vec<Category>>;
}
