//! Shared fixtures: an in-memory catalog backend with call counters

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use soundstore_core::{
    CatalogApi, CatalogError, Category, CategoryQuery, Deal, Pagination, Product, ProductPage,
    Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn product(id: &str, name: &str, category: &str, price: f64) -> Product {
    serde_json::from_value(json!({
        "_id": id,
        "name": name,
        "description": format!("{} by Acme", name),
        "category": { "_id": category, "name": category },
        "brand": "Acme",
        "price": price,
        "stock": 10,
        "averageRating": 4.0,
        "totalReviews": 3
    }))
    .unwrap()
}

pub fn deal(id: &str, original: f64, price: f64, discount: f64) -> Deal {
    serde_json::from_value(json!({
        "_id": id,
        "originalPrice": original,
        "price": price,
        "discount": discount,
        "discountAmount": original - price
    }))
    .unwrap()
}

pub fn catalog() -> Vec<Product> {
    vec![
        product("p1", "Bluetooth Speaker", "speakers", 120.0),
        product("p2", "Studio Headphones", "headphones", 199.0),
        product("p3", "Wireless Earbuds", "headphones", 89.0),
        product("p4", "Phono Preamp", "amplifiers", 150.0),
    ]
}

fn backend_down(endpoint: &str) -> CatalogError {
    CatalogError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
    }
}

/// Fake backend; every call increments a counter
#[derive(Default)]
pub struct FakeCatalog {
    pub products: RwLock<Vec<Product>>,
    pub deals: RwLock<Vec<Deal>>,
    pub categories: RwLock<Vec<Category>>,
    /// (category id, page) -> page served
    pub category_pages: RwLock<HashMap<(String, u32), ProductPage>>,

    pub fail_products: AtomicBool,
    pub fail_deals: AtomicBool,
    pub fail_category_products: AtomicBool,

    /// When set, product fetches wait for a notification before answering
    pub hold_products: AtomicBool,
    pub release: Notify,

    pub product_calls: AtomicUsize,
    pub deal_calls: AtomicUsize,
    pub category_product_calls: AtomicUsize,
    pub category_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(products: Vec<Product>, deals: Vec<Deal>) -> Self {
        let fake = Self::default();
        *fake.products.write() = products;
        *fake.deals.write() = deals;
        fake
    }

    /// Serve `products` as page `page` of `total_pages` for a category
    pub fn with_category_page(
        self,
        category_id: &str,
        page: u32,
        total_pages: u32,
        products: Vec<Product>,
    ) -> Self {
        let pagination = Pagination {
            current_page: page,
            total_pages,
            total_products: (total_pages * 24) as u64,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        };
        self.category_pages.write().insert(
            (category_id.to_string(), page),
            ProductPage {
                products,
                pagination,
            },
        );
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn fetch_products(&self, _query: &CategoryQuery) -> Result<ProductPage> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_products.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(backend_down("/products"));
        }
        let products = self.products.read().clone();
        let pagination = Pagination::single_page(products.len());
        Ok(ProductPage {
            products,
            pagination,
        })
    }

    async fn fetch_deals(&self) -> Result<Vec<Deal>> {
        self.deal_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deals.load(Ordering::SeqCst) {
            return Err(backend_down("/products/deals"));
        }
        Ok(self.deals.read().clone())
    }

    async fn fetch_category_products(
        &self,
        category_id: &str,
        query: &CategoryQuery,
    ) -> Result<ProductPage> {
        self.category_product_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_category_products.load(Ordering::SeqCst) {
            return Err(backend_down("/categories/products"));
        }
        let pages = self.category_pages.read();
        Ok(pages
            .get(&(category_id.to_string(), query.page))
            .cloned()
            .unwrap_or(ProductPage {
                products: Vec::new(),
                pagination: Pagination::single_page(0),
            }))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories.read().clone())
    }
}
