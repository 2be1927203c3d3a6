//! Category, pagination and listing query models

use super::null_as_default;
use serde::{Deserialize, Serialize};

/// A browsable product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
}

/// Pagination metadata attached to product listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub current_page: u32,

    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub total_products: u64,

    #[serde(default)]
    pub has_next_page: bool,

    #[serde(default)]
    pub has_prev_page: bool,
}

fn first_page() -> u32 {
    1
}

impl Pagination {
    /// Metadata for a response that carried no pagination block
    pub fn single_page(count: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: u32::from(count > 0),
            total_products: count as u64,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::single_page(0)
    }
}

/// Query parameters for a paginated product listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl Default for CategoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 24,
            sort: None,
        }
    }
}

impl CategoryQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Query-string pairs in the order the backend documents them
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}
