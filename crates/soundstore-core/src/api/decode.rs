//! Response decoding for the catalog backend
//!
//! The backend wraps every listing in `{ "data": ... }`, where `data` is
//! either the bare array or an object holding the array under a named field
//! plus an optional `pagination` block. Anything else is a decode error.
//!
//! Records serialized with virtuals carry both `_id` and `id`; `_id` wins.

use crate::error::{CatalogError, Result};
use crate::models::{Category, Deal, Pagination, Product, ProductPage};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode a product listing envelope
pub fn decode_product_page(endpoint: &str, body: Value) -> Result<ProductPage> {
    let (items, pagination) = decode_list::<Product>(endpoint, body, &["products"])?;
    let pagination = pagination.unwrap_or_else(|| Pagination::single_page(items.len()));
    Ok(ProductPage {
        products: items,
        pagination,
    })
}

/// Decode a deal listing envelope
pub fn decode_deals(endpoint: &str, body: Value) -> Result<Vec<Deal>> {
    decode_list(endpoint, body, &["deals", "products"]).map(|(items, _)| items)
}

/// Decode a category listing envelope
pub fn decode_categories(endpoint: &str, body: Value) -> Result<Vec<Category>> {
    decode_list(endpoint, body, &["categories"]).map(|(items, _)| items)
}

fn decode_list<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    fields: &[&str],
) -> Result<(Vec<T>, Option<Pagination>)> {
    let Value::Object(mut envelope) = body else {
        return Err(CatalogError::decode(endpoint, "response is not a JSON object"));
    };
    let Some(data) = envelope.remove("data") else {
        return Err(CatalogError::decode(endpoint, "missing `data` field"));
    };

    match data {
        Value::Array(_) => Ok((items_from(endpoint, data)?, None)),
        Value::Object(mut inner) => {
            let Some(list) = take_first(&mut inner, fields) else {
                return Err(CatalogError::decode(
                    endpoint,
                    format!("`data` has none of: {}", fields.join(", ")),
                ));
            };
            let items = items_from(endpoint, list)?;
            let pagination = match inner.remove("pagination") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(serde_json::from_value(raw).map_err(|source| {
                    CatalogError::Decode {
                        endpoint: endpoint.to_string(),
                        message: "invalid pagination block".to_string(),
                        source: Some(source),
                    }
                })?),
            };
            Ok((items, pagination))
        }
        other => Err(CatalogError::decode(
            endpoint,
            format!("`data` is {}, expected array or object", type_name(&other)),
        )),
    }
}

fn take_first(map: &mut Map<String, Value>, fields: &[&str]) -> Option<Value> {
    fields.iter().find_map(|f| map.remove(*f))
}

fn items_from<T: DeserializeOwned>(endpoint: &str, mut list: Value) -> Result<Vec<T>> {
    drop_virtual_ids(&mut list);
    serde_json::from_value(list).map_err(|source| CatalogError::Decode {
        endpoint: endpoint.to_string(),
        message: "invalid item list".to_string(),
        source: Some(source),
    })
}

/// Remove `id` wherever `_id` is also present, including nested records
fn drop_virtual_ids(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(drop_virtual_ids),
        Value::Object(map) => {
            if map.contains_key("_id") {
                map.remove("id");
            }
            map.values_mut().for_each(drop_virtual_ids);
        }
        _ => {}
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
