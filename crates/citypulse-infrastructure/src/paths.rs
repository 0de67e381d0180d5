//! Unified path management for citypulse files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/citypulse/         # Config directory
//! ├── config.toml              # Client configuration
//! ├── auth-storage.json        # Persisted session snapshot
//! └── logs/                    # Log files
//! ```

use std::path::PathBuf;

use citypulse_core::error::{CityPulseError, Result};
use citypulse_core::session::SESSION_STORAGE_KEY;

const APP_DIR: &str = "citypulse";

/// Path resolver rooted at the platform config directory or an explicit base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityPulsePaths {
    base: PathBuf,
}

impl CityPulsePaths {
    /// Resolves the platform config directory (`~/.config/citypulse` on Linux).
    ///
    /// # Returns
    ///
    /// - `Ok(CityPulsePaths)`: Paths rooted at the config directory
    /// - `Err(CityPulseError::Config)`: The home directory could not be determined
    pub fn resolve() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| CityPulseError::config("Cannot find home directory"))?
            .join(APP_DIR);
        Ok(Self { base })
    }

    /// Uses `base` instead of the platform directory (tests, portable setups).
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolves from an optional override.
    pub fn new(base_override: Option<PathBuf>) -> Result<Self> {
        match base_override {
            Some(base) => Ok(Self::with_base(base)),
            None => Self::resolve(),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.base.clone()
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    /// File backing the persisted session, named after the storage key.
    pub fn session_file(&self) -> PathBuf {
        self.base.join(format!("{SESSION_STORAGE_KEY}.json"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }
}
