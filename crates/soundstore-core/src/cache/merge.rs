//! Deal merge: annotate products with their active deal

use crate::models::{Deal, Product, ProductView};
use std::collections::HashMap;

/// Annotate every product with `hasActiveDeal`, overriding pricing where a
/// deal exists for its id. Product order is preserved.
pub fn merge_deals(products: Vec<Product>, deals: &[Deal]) -> Vec<ProductView> {
    let by_product: HashMap<&str, &Deal> = deals.iter().map(|d| (d.id.as_str(), d)).collect();

    products
        .into_iter()
        .map(|product| {
            let deal = by_product.get(product.id.as_str()).copied();
            match deal {
                Some(deal) => ProductView::with_deal(product, deal),
                None => ProductView::plain(product),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, price: f64) -> Product {
        serde_json::from_value(json!({ "_id": id, "name": id, "price": price })).unwrap()
    }

    fn deal(id: &str, original: f64, price: f64) -> Deal {
        serde_json::from_value(json!({
            "_id": id,
            "originalPrice": original,
            "price": price,
            "discount": ((original - price) / original * 100.0).round()
        }))
        .unwrap()
    }

    #[test]
    fn test_matching_products_get_deal_price() {
        let products = vec![product("a", 100.0), product("b", 50.0), product("c", 20.0)];
        let deals = vec![deal("b", 50.0, 40.0)];

        let merged = merge_deals(products, &deals);

        assert_eq!(merged.len(), 3);
        assert!(!merged[0].has_active_deal);
        assert_eq!(merged[0].product.price, 100.0);
        assert!(merged[0].product.original_price.is_none());

        assert!(merged[1].has_active_deal);
        assert_eq!(merged[1].product.price, 40.0);
        assert_eq!(merged[1].product.original_price, Some(50.0));
        assert_eq!(merged[1].product.discount, Some(20.0));

        assert!(!merged[2].has_active_deal);
    }

    #[test]
    fn test_deals_for_unknown_products_are_ignored() {
        let merged = merge_deals(vec![product("a", 10.0)], &[deal("zzz", 10.0, 5.0)]);
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].has_active_deal);
    }

    #[test]
    fn test_no_deals() {
        let merged = merge_deals(vec![product("a", 10.0)], &[]);
        assert_eq!(merged[0].product, product("a", 10.0));
    }
}
