//! Atomic JSON file operations.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use citypulse_core::error::{CityPulseError, Result};

/// A JSON document on disk, replaced atomically on every save.
///
/// Writes go to a sibling temp file, are fsynced, then renamed over the
/// target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        restrict_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Deletes the file. Succeeds when it does not exist.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| CityPulseError::io("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| CityPulseError::io("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

// Session snapshots carry credentials: user read/write only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
