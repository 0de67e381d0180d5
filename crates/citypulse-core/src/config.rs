//! Client configuration model.
//!
//! The document is stored as `config.toml`; every section falls back to its
//! defaults when absent.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration document.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigRoot {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Remote backend (auth, rows, blobs).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

/// Third-party location catalog.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: None,
            language: default_language(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://data-api.oxilor.com/rest".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Store tunables.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Items per content feed page.
    pub feed_page_size: usize,
    /// Entries requested per catalog page.
    pub catalog_page_size: usize,
    /// Upper bound on pages walked by a bulk catalog load.
    pub catalog_max_pages: usize,
    /// Trimmed query length below which no search is issued.
    pub min_search_len: usize,
    pub search_debounce_ms: u64,
    /// Catalog classification requested (`kind` / `type` parameter).
    pub catalog_kind: String,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            feed_page_size: 20,
            catalog_page_size: 100,
            catalog_max_pages: 50,
            min_search_len: 3,
            search_debounce_ms: 500,
            catalog_kind: "city".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
