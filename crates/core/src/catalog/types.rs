//! Types for the catalog store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{QueryLimits, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Where the published catalog lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogBackend {
    /// In-process snapshot, swapped atomically on publish.
    Snapshot,
    /// SQLite database at `[database].path`.
    #[default]
    Sqlite,
}

impl CatalogBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub backend: CatalogBackend,

    /// Page size when a query does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::default(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl CatalogConfig {
    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

/// Aggregates over one generation's records.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GenerationSummary {
    pub record_count: u64,
    pub in_stock_count: u64,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

/// Summary of the published generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Published generation id (0 = never populated).
    pub generation: u64,
    pub record_count: u64,
    pub in_stock_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Backend serving the catalog.
    pub backend: String,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_serialization() {
        assert_eq!(
            serde_json::to_string(&CatalogBackend::Snapshot).unwrap(),
            "\"snapshot\""
        );
        assert_eq!(
            serde_json::to_string(&CatalogBackend::Sqlite).unwrap(),
            "\"sqlite\""
        );
        assert_eq!(CatalogBackend::default(), CatalogBackend::Sqlite);
    }

    #[test]
    fn test_catalog_config_defaults() {
        let config: CatalogConfig = toml::from_str("").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.limits(), QueryLimits::default());

        let config: CatalogConfig = toml::from_str(
            r#"
            backend = "snapshot"
            max_page_size = 50
        "#,
        )
        .unwrap();
        assert_eq!(config.backend, CatalogBackend::Snapshot);
        assert_eq!(config.limits().max_page_size, 50);
        assert_eq!(config.limits().default_page_size, 20);
    }

    #[test]
    fn test_catalog_stats_serialization() {
        let stats = CatalogStats {
            generation: 0,
            record_count: 0,
            in_stock_count: 0,
            price_min: None,
            price_max: None,
            published_at: None,
            backend: "snapshot".to_string(),
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("recordCount"));
        assert!(!json.contains("priceMin")); // None should be skipped
    }
}
