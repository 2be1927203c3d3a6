//! Promotional deal records

use super::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An active promotional override for one product
///
/// The deals endpoint returns deal-augmented product records; only the
/// pricing fields are kept here, keyed by the product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Id of the product this deal applies to
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,

    /// Discounted price
    pub price: f64,

    /// Discount in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_info: Option<Value>,
}

impl Deal {
    /// Absolute saving, from `discountAmount` or derived from the two prices
    pub fn savings(&self) -> Option<f64> {
        self.discount_amount
            .or_else(|| self.original_price.map(|orig| orig - self.price))
            .filter(|s| *s > 0.0)
    }
}
