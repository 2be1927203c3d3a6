//! Error types for soundstore-core
//!
//! A single error hierarchy built with thiserror. Fetch failures are scoped
//! to the cache entry that requested them; nothing here is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the core crate
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Core error type for catalog and cache operations
#[derive(Error, Debug)]
pub enum CatalogError {
    // ===================
    // Transport Errors
    // ===================
    #[error("Request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    // ===================
    // Decode Errors
    // ===================
    #[error("Unexpected response shape from {endpoint}: {message}")]
    Decode {
        endpoint: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // ===================
    // Session Storage Errors
    // ===================
    #[error("Session storage error at {path}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rating journal: {message}")]
    Journal {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CatalogError {
    /// Build a decode error without an underlying serde error
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for failures caused by the network or the backend,
    /// as opposed to local storage or configuration problems
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CatalogError::Http { .. } | CatalogError::Status { .. } | CatalogError::Decode { .. }
        )
    }
}
