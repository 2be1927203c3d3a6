//! Cache entries and their lifecycle
//!
//! Each entry moves `Empty -> Loading -> Ready` on success and
//! `Empty/Ready -> Loading -> Error` on failure. Failed fetches keep
//! whatever data the entry already held.

use crate::models::{CategoryQuery, Pagination, Product};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Derived lifecycle state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Empty,
    Loading,
    Ready,
    Error,
}

/// One cached listing
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: Vec<T>,
    /// Total reported by the backend (may exceed `data.len()`)
    pub total: usize,
    /// True only while a fetch for this entry is in flight
    pub loading: bool,
    pub error: Option<String>,
    /// Set only on successful completion
    pub last_fetched: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            loading: false,
            error: None,
            last_fetched: None,
        }
    }
}

impl<T> CacheEntry<T> {
    pub fn state(&self) -> EntryState {
        if self.loading {
            EntryState::Loading
        } else if self.error.is_some() {
            EntryState::Error
        } else if self.last_fetched.is_some() {
            EntryState::Ready
        } else {
            EntryState::Empty
        }
    }

    /// Last successful fetch is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Some(fetched) = self.last_fetched else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(fetched) < ttl,
            Err(_) => true,
        }
    }

    /// Fresh and non-empty: safe to serve without a network call
    pub fn is_hit(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.is_fresh(ttl, now) && !self.data.is_empty()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_fetched.map(|t| now.signed_duration_since(t))
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn complete(&mut self, data: Vec<T>, total: usize, at: DateTime<Utc>) {
        self.data = data;
        self.total = total;
        self.loading = false;
        self.error = None;
        self.last_fetched = Some(at);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn status(&self, ttl: Duration, now: DateTime<Utc>) -> EntryStatus {
        EntryStatus {
            state: self.state(),
            items: self.data.len(),
            fresh: self.is_fresh(ttl, now),
            age_secs: self.age(now).map(|a| a.num_seconds()),
            error: self.error.clone(),
        }
    }
}

/// Category bucket: one page of a category plus the query that produced it
///
/// Buckets are keyed by category id alone, so fetching another page or sort
/// order of the same category replaces the bucket's contents.
#[derive(Debug, Clone, Default)]
pub struct CategoryBucket {
    pub entry: CacheEntry<Product>,
    pub pagination: Pagination,
    pub query: Option<CategoryQuery>,
}

impl CategoryBucket {
    /// Bucket can answer `query` without a fetch
    pub fn serves(&self, query: &CategoryQuery, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.query.as_ref() == Some(query) && self.entry.is_hit(ttl, now)
    }
}

/// Serializable snapshot of one entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub state: EntryState,
    pub items: usize,
    pub fresh: bool,
    pub age_secs: Option<i64>,
    pub error: Option<String>,
}
