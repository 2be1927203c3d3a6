//! Session-scoped key/value storage and the rating journal built on it
//!
//! Session storage outlives a single cache instance (a page reload, a new
//! CLI invocation) but is not meant as durable storage: clearing the
//! session directory is always safe.

use crate::error::{CatalogError, Result};
use crate::models::{RatingRecord, RatingUpdate};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Minimal string key/value store
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

/// File-backed session store: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CatalogError::Storage { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CatalogError::Storage {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|source| CatalogError::Storage { path, source })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CatalogError::Storage { path, source }),
        }
    }
}

/// Persisted map of product id -> latest rating patch
#[derive(Clone)]
pub struct RatingJournal {
    store: Arc<dyn SessionStore>,
}

impl RatingJournal {
    /// Fixed session key the journal lives under
    pub const KEY: &'static str = "productRatingUpdates";

    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Read every recorded patch; an absent journal is empty
    pub fn load(&self) -> Result<HashMap<String, RatingRecord>> {
        let Some(raw) = self.store.get(Self::KEY)? else {
            return Ok(HashMap::new());
        };
        serde_json::from_str(&raw).map_err(|source| CatalogError::Journal {
            message: format!("cannot parse {}", Self::KEY),
            source,
        })
    }

    /// Record a patch, replacing any earlier one for the same product
    ///
    /// A corrupt journal is replaced rather than failing the write.
    pub fn record(&self, update: &RatingUpdate, at: DateTime<Utc>) -> Result<()> {
        let mut records = self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable rating journal");
            HashMap::new()
        });
        records.insert(
            update.product_id.clone(),
            RatingRecord::from_update(update, at),
        );
        self.write(&records)
    }

    /// Drop the patches for the given products
    pub fn forget(&self, product_ids: &[String]) -> Result<()> {
        let mut records = self.load()?;
        let before = records.len();
        for id in product_ids {
            records.remove(id);
        }
        if records.len() == before {
            return Ok(());
        }
        if records.is_empty() {
            return self.clear();
        }
        self.write(&records)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(Self::KEY)
    }

    fn write(&self, records: &HashMap<String, RatingRecord>) -> Result<()> {
        let json = serde_json::to_string(records).map_err(|source| CatalogError::Journal {
            message: "cannot serialize rating journal".to_string(),
            source,
        })?;
        self.store.set(Self::KEY, &json)
    }
}
