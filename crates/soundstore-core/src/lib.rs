//! soundstore-core - Core library for soundstore
//!
//! Provides catalog models, the REST API boundary, and the TTL-based
//! product/deal cache consumed by storefront frontends.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod models;
pub mod session;

pub use api::{CatalogApi, HttpCatalogApi};
pub use cache::{CacheStatus, CategoryPage, Fetched, ProductCache, RatingSink};
pub use config::{CacheTtl, CatalogConfig};
pub use error::{CatalogError, Result};
pub use event::{CacheEvent, EntryKind, EventBus};
pub use models::{
    Category, CategoryQuery, Deal, Pagination, Product, ProductPage, ProductView, RatingUpdate,
};
pub use session::{FileSessionStore, MemorySessionStore, RatingJournal, SessionStore};
