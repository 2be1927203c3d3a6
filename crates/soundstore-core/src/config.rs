//! Configuration for the catalog client and product cache
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! file (or no file at all) yields a working configuration.
//!
//! ```toml
//! api_base_url = "https://shop.example.com/api"
//! request_timeout_secs = 10
//!
//! [ttl]
//! deals_secs = 60
//! ```

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-kind freshness windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtl {
    pub products_secs: u64,
    pub deals_secs: u64,
    pub categories_secs: u64,
    pub category_products_secs: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            products_secs: 5 * 60,
            deals_secs: 2 * 60,
            categories_secs: 10 * 60,
            category_products_secs: 3 * 60,
        }
    }
}

impl CacheTtl {
    /// Every entry stale immediately (useful for tests and `--no-cache` style runs)
    pub fn disabled() -> Self {
        Self {
            products_secs: 0,
            deals_secs: 0,
            categories_secs: 0,
            category_products_secs: 0,
        }
    }

    pub fn products(&self) -> Duration {
        Duration::from_secs(self.products_secs)
    }

    pub fn deals(&self) -> Duration {
        Duration::from_secs(self.deals_secs)
    }

    pub fn categories(&self) -> Duration {
        Duration::from_secs(self.categories_secs)
    }

    pub fn category_products(&self) -> Duration {
        Duration::from_secs(self.category_products_secs)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the storefront REST API, without trailing slash
    pub api_base_url: String,

    /// HTTP request timeout
    pub request_timeout_secs: u64,

    /// Page size used when fetching the full product list
    pub all_products_limit: u32,

    /// Directory for session-scoped storage (rating journal).
    /// `None` falls back to the platform cache directory.
    pub session_dir: Option<PathBuf>,

    pub ttl: CacheTtl,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 15,
            all_products_limit: 1000,
            session_dir: None,
            ttl: CacheTtl::default(),
        }
    }
}

impl CatalogConfig {
    /// Load from a TOML file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Catalog config loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| CatalogError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(CatalogError::InvalidConfig {
                message: "api_base_url must not be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CatalogError::InvalidConfig {
                message: format!("api_base_url must be http(s): {}", url),
            });
        }
        if self.all_products_limit == 0 {
            return Err(CatalogError::InvalidConfig {
                message: "all_products_limit must be positive".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(CatalogError::InvalidConfig {
                message: "request_timeout_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Resolved session directory (`<cache_dir>/soundstore/session` by default)
    pub fn resolved_session_dir(&self) -> Option<PathBuf> {
        self.session_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("soundstore").join("session")))
    }
}
