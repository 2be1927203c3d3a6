//! Rating patch models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New aggregate rating for a product, sent after a review is submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    pub product_id: String,
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl RatingUpdate {
    pub fn new(product_id: impl Into<String>, average_rating: f64, total_reviews: u32) -> Self {
        Self {
            product_id: product_id.into(),
            average_rating,
            total_reviews,
        }
    }
}

/// Journal entry for one product's latest rating patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub average_rating: f64,
    pub total_reviews: u32,
    pub timestamp: DateTime<Utc>,
}

impl RatingRecord {
    pub fn from_update(update: &RatingUpdate, at: DateTime<Utc>) -> Self {
        Self {
            average_rating: update.average_rating,
            total_reviews: update.total_reviews,
            timestamp: at,
        }
    }
}
