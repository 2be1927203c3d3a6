//! Product cache with DashMap + parking_lot::RwLock
//!
//! Flat entries (products, deals, categories) sit behind `parking_lot::RwLock`;
//! category buckets use a DashMap keyed by category id so one category's
//! refresh never contends with another's. No lock is held across an await.
//!
//! There is no single-flight: two concurrent fetches of the same key both
//! reach the backend and whichever completes last wins.

use super::coherency::RatingSink;
use super::entry::{CacheEntry, CategoryBucket, EntryStatus};
use super::merge::merge_deals;
use super::{CategoryPage, Fetched};
use crate::api::CatalogApi;
use crate::config::{CacheTtl, CatalogConfig};
use crate::error::{CatalogError, Result};
use crate::event::{CacheEvent, EntryKind, EventBus};
use crate::models::{
    Category, CategoryQuery, Deal, Product, ProductView, RatingRecord, RatingUpdate,
};
use crate::session::{MemorySessionStore, RatingJournal, SessionStore};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Snapshot of every entry, for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub products: EntryStatus,
    pub deals: EntryStatus,
    pub categories: EntryStatus,
    pub category_buckets: BTreeMap<String, EntryStatus>,
    /// Products whose rating is currently overridden by a session patch
    pub rating_overrides: usize,
}

/// Central catalog cache
///
/// Construct once at startup and share behind an `Arc`.
pub struct ProductCache {
    api: Arc<dyn CatalogApi>,

    /// Freshness windows, fixed at construction
    ttl: CacheTtl,

    /// Page size for the full product listing
    all_products_limit: u32,

    products: RwLock<CacheEntry<Product>>,
    deals: RwLock<CacheEntry<Deal>>,
    categories: RwLock<CacheEntry<Category>>,

    /// Category id -> last fetched page of that category
    category_products: DashMap<String, CategoryBucket>,

    /// Session rating patches applied over fetched products
    rating_overlay: RwLock<HashMap<String, RatingRecord>>,

    journal: RatingJournal,

    event_bus: EventBus,
}

impl ProductCache {
    /// Create a cache and replay the session rating journal into it
    pub fn new(
        api: Arc<dyn CatalogApi>,
        config: &CatalogConfig,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let cache = Self {
            api,
            ttl: config.ttl,
            all_products_limit: config.all_products_limit,
            products: RwLock::new(CacheEntry::default()),
            deals: RwLock::new(CacheEntry::default()),
            categories: RwLock::new(CacheEntry::default()),
            category_products: DashMap::new(),
            rating_overlay: RwLock::new(HashMap::new()),
            journal: RatingJournal::new(session),
            event_bus: EventBus::default(),
        };
        cache.hydrate();
        cache
    }

    /// Default configuration with an in-memory session
    pub fn with_defaults(api: Arc<dyn CatalogApi>) -> Self {
        Self::new(
            api,
            &CatalogConfig::default(),
            Arc::new(MemorySessionStore::new()),
        )
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn ttl(&self) -> &CacheTtl {
        &self.ttl
    }

    pub fn journal(&self) -> &RatingJournal {
        &self.journal
    }

    // ===================
    // Cache-aware reads
    // ===================

    /// Full product list, from memory when fresh
    pub async fn get_products(&self, force_refresh: bool) -> Result<Fetched<Product>> {
        let query = CategoryQuery::page(1, self.all_products_limit);
        let fetch = async {
            let page = self.api.fetch_products(&query).await?;
            let mut products = page.products;
            self.apply_overlay(&mut products);
            let total = (page.pagination.total_products as usize).max(products.len());
            Ok::<_, CatalogError>((products, total))
        };
        self.cached_fetch(
            EntryKind::Products,
            &self.products,
            self.ttl.products(),
            force_refresh,
            fetch,
            |count| CacheEvent::ProductsRefreshed { count },
        )
        .await
    }

    /// Active deals, from memory when fresh
    pub async fn get_deals(&self, force_refresh: bool) -> Result<Fetched<Deal>> {
        let fetch = async {
            let deals = self.api.fetch_deals().await?;
            let total = deals.len();
            Ok::<_, CatalogError>((deals, total))
        };
        self.cached_fetch(
            EntryKind::Deals,
            &self.deals,
            self.ttl.deals(),
            force_refresh,
            fetch,
            |count| CacheEvent::DealsRefreshed { count },
        )
        .await
    }

    /// Browsable categories, from memory when fresh
    pub async fn get_categories(&self, force_refresh: bool) -> Result<Fetched<Category>> {
        let fetch = async {
            let categories = self.api.fetch_categories().await?;
            let total = categories.len();
            Ok::<_, CatalogError>((categories, total))
        };
        self.cached_fetch(
            EntryKind::Categories,
            &self.categories,
            self.ttl.categories(),
            force_refresh,
            fetch,
            |count| CacheEvent::CategoriesRefreshed { count },
        )
        .await
    }

    /// Products annotated with their active deals
    ///
    /// Both listings load concurrently. If deals cannot be loaded the
    /// products are returned without deal pricing rather than failing.
    pub async fn get_products_with_deals(
        &self,
        force_refresh: bool,
    ) -> Result<Fetched<ProductView>> {
        let (products, deals) = tokio::join!(
            self.get_products(force_refresh),
            self.get_deals(force_refresh)
        );

        match (products, deals) {
            (Ok(products), Ok(deals)) => {
                let from_cache = products.from_cache && deals.from_cache;
                let data = merge_deals(products.data, &deals.data);
                let with_deal = data.iter().filter(|v| v.has_active_deal).count();
                debug!(products = data.len(), with_deal, from_cache, "Merged deals into products");
                Ok(Fetched {
                    data,
                    total_count: products.total_count,
                    from_cache,
                })
            }
            (Ok(products), Err(e)) => {
                warn!(error = %e, "Deals unavailable, serving products without deals");
                Ok(products.map(ProductView::plain))
            }
            (Err(e), _) => {
                warn!(error = %e, "Products with deals failed, falling back to products only");
                let products = self.get_products(force_refresh).await?;
                Ok(products.map(ProductView::plain))
            }
        }
    }

    /// One page of a category, from memory when the bucket is fresh and
    /// was fetched with the same query
    pub async fn get_category_products(
        &self,
        category_id: &str,
        params: &CategoryQuery,
        force_refresh: bool,
    ) -> Result<CategoryPage<Product>> {
        let ttl = self.ttl.category_products();

        if !force_refresh {
            if let Some(bucket) = self.category_products.get(category_id) {
                if bucket.serves(params, ttl, Utc::now()) {
                    debug!(category_id, page = params.page, "Category page served from cache");
                    return Ok(CategoryPage {
                        data: bucket.entry.data.clone(),
                        pagination: bucket.pagination.clone(),
                        from_cache: true,
                    });
                }
            }
        }

        self.category_products
            .entry(category_id.to_string())
            .or_default()
            .entry
            .begin_fetch();

        match self.api.fetch_category_products(category_id, params).await {
            Ok(page) => {
                let mut products = page.products;
                self.apply_overlay(&mut products);
                let count = products.len();
                {
                    let mut bucket = self
                        .category_products
                        .entry(category_id.to_string())
                        .or_default();
                    let total = page.pagination.total_products as usize;
                    bucket.entry.complete(products.clone(), total, Utc::now());
                    bucket.pagination = page.pagination.clone();
                    bucket.query = Some(params.clone());
                }
                info!(
                    category_id,
                    page = params.page,
                    count,
                    total_pages = page.pagination.total_pages,
                    "Category page fetched"
                );
                self.event_bus.publish(CacheEvent::CategoryRefreshed {
                    category_id: category_id.to_string(),
                    count,
                });
                Ok(CategoryPage {
                    data: products,
                    pagination: page.pagination,
                    from_cache: false,
                })
            }
            Err(e) => {
                if let Some(mut bucket) = self.category_products.get_mut(category_id) {
                    bucket.entry.fail(e.to_string());
                }
                warn!(category_id, error = %e, "Category page fetch failed");
                self.event_bus.publish(CacheEvent::FetchFailed {
                    kind: EntryKind::CategoryProducts,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// One category page annotated with active deals; degrades to the plain
    /// page when deals cannot be loaded
    pub async fn get_category_products_with_deals(
        &self,
        category_id: &str,
        params: &CategoryQuery,
        force_refresh: bool,
    ) -> Result<CategoryPage<ProductView>> {
        let (page, deals) = tokio::join!(
            self.get_category_products(category_id, params, force_refresh),
            self.get_deals(force_refresh)
        );

        match (page, deals) {
            (Ok(page), Ok(deals)) => {
                let from_cache = page.from_cache && deals.from_cache;
                Ok(CategoryPage {
                    data: merge_deals(page.data, &deals.data),
                    pagination: page.pagination,
                    from_cache,
                })
            }
            (Ok(page), Err(e)) => {
                warn!(category_id, error = %e, "Deals unavailable, serving category without deals");
                Ok(page.map(ProductView::plain))
            }
            (Err(e), _) => {
                warn!(category_id, error = %e, "Category with deals failed, falling back to plain category");
                let page = self
                    .get_category_products(category_id, params, force_refresh)
                    .await?;
                Ok(page.map(ProductView::plain))
            }
        }
    }

    // ===================
    // Synchronous lookups
    // ===================

    /// Look up a product in the cached flat list (no fetch on miss)
    pub fn get_product_by_id(&self, id: &str) -> Option<Product> {
        self.products.read().data.iter().find(|p| p.id == id).cloned()
    }

    /// Case-insensitive substring search over cached products
    pub fn search_products_in_cache(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.products
            .read()
            .data
            .iter()
            .filter(|p| p.matches_query(&needle))
            .cloned()
            .collect()
    }

    pub fn is_products_cached(&self) -> bool {
        self.products.read().is_fresh(self.ttl.products(), Utc::now())
    }

    pub fn is_deals_cached(&self) -> bool {
        self.deals.read().is_fresh(self.ttl.deals(), Utc::now())
    }

    pub fn is_categories_cached(&self) -> bool {
        self.categories
            .read()
            .is_fresh(self.ttl.categories(), Utc::now())
    }

    /// Number of populated category buckets
    pub fn category_bucket_count(&self) -> usize {
        self.category_products.len()
    }

    pub fn status(&self) -> CacheStatus {
        let now = Utc::now();
        let bucket_ttl = self.ttl.category_products();
        CacheStatus {
            products: self.products.read().status(self.ttl.products(), now),
            deals: self.deals.read().status(self.ttl.deals(), now),
            categories: self.categories.read().status(self.ttl.categories(), now),
            category_buckets: self
                .category_products
                .iter()
                .map(|b| (b.key().clone(), b.value().entry.status(bucket_ttl, now)))
                .collect(),
            rating_overrides: self.rating_overlay.read().len(),
        }
    }

    /// Reset every entry to its initial empty state
    ///
    /// Session rating patches are kept: they describe the session, not the cache.
    pub fn clear_cache(&self) {
        *self.products.write() = CacheEntry::default();
        *self.deals.write() = CacheEntry::default();
        *self.categories.write() = CacheEntry::default();
        self.category_products.clear();

        info!("Product cache cleared");
        self.event_bus.publish(CacheEvent::Cleared);
    }

    // ===================
    // Rating coherency
    // ===================

    /// Drop every session rating patch, in memory and in the journal
    ///
    /// Cached copies keep their current ratings until the next fetch.
    /// Returns how many patches were dropped.
    pub fn clear_session(&self) -> Result<usize> {
        let dropped = {
            let mut overlay = self.rating_overlay.write();
            let count = overlay.len();
            overlay.clear();
            count
        };
        self.journal.clear()?;
        info!(dropped, "Session rating patches cleared");
        Ok(dropped)
    }

    /// Replay the session rating journal into the overlay and any cached copies
    ///
    /// Called by the constructor; returns the number of journal records.
    pub fn hydrate(&self) -> usize {
        let records = match self.journal.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable rating journal");
                return 0;
            }
        };
        if records.is_empty() {
            return 0;
        }

        let patched: usize = records
            .iter()
            .map(|(id, record)| self.patch_cached_copies(id, record))
            .sum();
        let count = records.len();
        self.rating_overlay.write().extend(records);

        debug!(records = count, patched, "Rating journal replayed");
        count
    }

    /// Apply session patches to freshly fetched products
    ///
    /// A patch yields once the backend reports at least as many reviews as
    /// the patch did; yielded patches leave the overlay and the journal.
    fn apply_overlay(&self, products: &mut [Product]) {
        let mut caught_up = Vec::new();
        {
            let overlay = self.rating_overlay.read();
            if overlay.is_empty() {
                return;
            }
            for product in products.iter_mut() {
                let Some(record) = overlay.get(&product.id) else {
                    continue;
                };
                if product.total_reviews >= record.total_reviews {
                    caught_up.push((product.id.clone(), product.total_reviews));
                } else {
                    set_rating(product, record);
                }
            }
        }
        if caught_up.is_empty() {
            return;
        }

        let mut dropped = Vec::with_capacity(caught_up.len());
        {
            let mut overlay = self.rating_overlay.write();
            for (id, backend_reviews) in caught_up {
                // A newer patch may have landed since the read above
                let superseded = overlay
                    .get(&id)
                    .is_some_and(|r| r.total_reviews <= backend_reviews);
                if superseded {
                    overlay.remove(&id);
                    dropped.push(id);
                }
            }
        }
        if dropped.is_empty() {
            return;
        }
        if let Err(e) = self.journal.forget(&dropped) {
            warn!(error = %e, "Failed to drop superseded rating patches from journal");
        }
        debug!(count = dropped.len(), "Backend ratings caught up with session patches");
    }

    fn patch_cached_copies(&self, product_id: &str, record: &RatingRecord) -> usize {
        let mut copies = patch_list(&mut self.products.write().data, product_id, record);
        for mut bucket in self.category_products.iter_mut() {
            copies += patch_list(&mut bucket.entry.data, product_id, record);
        }
        copies
    }

    // ===================
    // Internals
    // ===================

    async fn cached_fetch<T, Fut>(
        &self,
        kind: EntryKind,
        slot: &RwLock<CacheEntry<T>>,
        ttl: Duration,
        force_refresh: bool,
        fetch: Fut,
        refreshed: fn(usize) -> CacheEvent,
    ) -> Result<Fetched<T>>
    where
        T: Clone,
        Fut: Future<Output = Result<(Vec<T>, usize)>>,
    {
        if !force_refresh {
            let entry = slot.read();
            if entry.is_hit(ttl, Utc::now()) {
                debug!(%kind, count = entry.data.len(), "Served from cache");
                return Ok(Fetched {
                    data: entry.data.clone(),
                    total_count: entry.total,
                    from_cache: true,
                });
            }
        }

        slot.write().begin_fetch();

        match fetch.await {
            Ok((data, total)) => {
                let count = data.len();
                slot.write().complete(data.clone(), total, Utc::now());
                info!(%kind, count, total, "Fetched");
                self.event_bus.publish(refreshed(count));
                Ok(Fetched {
                    data,
                    total_count: total,
                    from_cache: false,
                })
            }
            Err(e) => {
                slot.write().fail(e.to_string());
                warn!(%kind, error = %e, "Fetch failed");
                self.event_bus.publish(CacheEvent::FetchFailed {
                    kind,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

impl RatingSink for ProductCache {
    fn apply_rating_update(&self, update: &RatingUpdate) -> usize {
        let now = Utc::now();
        let record = RatingRecord::from_update(update, now);

        self.rating_overlay
            .write()
            .insert(update.product_id.clone(), record.clone());

        if let Err(e) = self.journal.record(update, now) {
            warn!(product_id = %update.product_id, error = %e, "Failed to persist rating update");
        }

        let copies = self.patch_cached_copies(&update.product_id, &record);
        info!(
            product_id = %update.product_id,
            average_rating = update.average_rating,
            total_reviews = update.total_reviews,
            copies,
            "Rating patched"
        );
        self.event_bus.publish(CacheEvent::RatingPatched {
            product_id: update.product_id.clone(),
            copies,
        });
        copies
    }
}

fn set_rating(product: &mut Product, record: &RatingRecord) {
    product.average_rating = record.average_rating;
    product.total_reviews = record.total_reviews;
}

fn patch_list(products: &mut [Product], product_id: &str, record: &RatingRecord) -> usize {
    let mut copies = 0;
    for product in products.iter_mut().filter(|p| p.id == product_id) {
        set_rating(product, record);
        copies += 1;
    }
    copies
}
