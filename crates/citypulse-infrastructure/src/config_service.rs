//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/citypulse/config.toml` and
//! layers environment overrides on top.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use citypulse_core::config::ConfigRoot;
use citypulse_core::error::Result;

use crate::paths::CityPulsePaths;

pub const ENV_BACKEND_URL: &str = "CITYPULSE_BACKEND_URL";
pub const ENV_BACKEND_ANON_KEY: &str = "CITYPULSE_BACKEND_ANON_KEY";
pub const ENV_CATALOG_URL: &str = "CITYPULSE_CATALOG_URL";
pub const ENV_CATALOG_API_KEY: &str = "CITYPULSE_CATALOG_API_KEY";

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: CityPulsePaths,
    config: Arc<RwLock<Option<ConfigRoot>>>,
}

impl ConfigService {
    pub fn new(paths: CityPulsePaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn paths(&self) -> &CityPulsePaths {
        &self.paths
    }

    /// Gets the configuration, loading it on first access.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn get_config(&self) -> Result<ConfigRoot> {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut loaded = load_file(&self.paths.config_file())?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn load_file(path: &Path) -> Result<ConfigRoot> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "[Config] no config file, using defaults");
        return Ok(ConfigRoot::default());
    }
    let content = std::fs::read_to_string(path)?;
    let root: ConfigRoot = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "[Config] loaded");
    Ok(root)
}

/// Environment values win over the file; blank values are ignored.
fn apply_env_overrides(root: &mut ConfigRoot, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = get(ENV_BACKEND_URL) {
        root.backend.url = Some(url);
    }
    if let Some(key) = get(ENV_BACKEND_ANON_KEY) {
        root.backend.anon_key = Some(key);
    }
    if let Some(url) = get(ENV_CATALOG_URL) {
        root.catalog.base_url = url;
    }
    if let Some(key) = get(ENV_CATALOG_API_KEY) {
        root.catalog.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let root = load_file(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(root, ConfigRoot::default());
    }

    #[test]
    fn test_file_is_loaded_and_cached() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CityPulsePaths::with_base(temp_dir.path());
        std::fs::write(
            paths.config_file(),
            "[client]\nfeed_page_size = 10\n\n[catalog]\nlanguage = \"ro\"\n",
        )
        .unwrap();

        let service = ConfigService::new(paths.clone());
        let config = service.get_config().unwrap();
        assert_eq!(config.client.feed_page_size, 10);
        assert_eq!(config.catalog.language, "ro");

        std::fs::write(paths.config_file(), "[client]\nfeed_page_size = 5\n").unwrap();
        assert_eq!(service.get_config().unwrap().client.feed_page_size, 10);
        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().client.feed_page_size, 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[client\n").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND_URL, "https://proj.supabase.co"),
            (ENV_BACKEND_ANON_KEY, "anon"),
            (ENV_CATALOG_API_KEY, "  "),
        ]);
        let mut root = ConfigRoot::default();
        apply_env_overrides(&mut root, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(root.backend.url.as_deref(), Some("https://proj.supabase.co"));
        assert_eq!(root.backend.anon_key.as_deref(), Some("anon"));
        assert!(root.catalog.api_key.is_none());
    }
}
