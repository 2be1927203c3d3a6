//! Product models as served by the catalog backend

use super::{null_as_default, Deal, Pagination};
use serde::{Deserialize, Serialize};

/// Category reference embedded in a product record
///
/// Listing endpoints return either the bare category id or a populated
/// summary object, depending on the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Summary {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Summary { id, .. } => id,
        }
    }

    /// Human-readable label, falling back to the id
    pub fn label(&self) -> &str {
        match self {
            CategoryRef::Summary { name, .. } if !name.is_empty() => name,
            other => other.id(),
        }
    }

    /// Case-insensitive match against an already lowercased needle
    fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            CategoryRef::Id(id) => id.to_lowercase().contains(needle),
            CategoryRef::Summary { id, name, slug } => {
                name.to_lowercase().contains(needle)
                    || id.to_lowercase().contains(needle)
                    || slug
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(needle))
            }
        }
    }
}

/// A catalog product (read-only copy of the backend record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub average_rating: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_reviews: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}

impl Product {
    /// Case-insensitive substring match over name, description and category
    ///
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .category
                .as_ref()
                .is_some_and(|c| c.contains_lowercase(needle))
    }

    pub fn category_label(&self) -> &str {
        self.category.as_ref().map(CategoryRef::label).unwrap_or("-")
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product annotated with its active deal, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub has_active_deal: bool,
}

impl ProductView {
    /// Product with no deal applied; price fields untouched
    pub fn plain(product: Product) -> Self {
        Self {
            product,
            has_active_deal: false,
        }
    }

    /// Product with the deal's pricing overriding its own
    pub fn with_deal(mut product: Product, deal: &Deal) -> Self {
        let list_price = product.price;
        product.price = deal.price;
        product.discounted_price = Some(deal.price);
        product.original_price = Some(deal.original_price.unwrap_or(list_price));
        product.discount = deal.discount.or(product.discount);
        Self {
            product,
            has_active_deal: true,
        }
    }
}

/// One page of products plus its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}
