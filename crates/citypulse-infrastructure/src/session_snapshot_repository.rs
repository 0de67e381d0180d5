//! File-backed implementation of the session snapshot repository.

use async_trait::async_trait;
use std::path::PathBuf;

use citypulse_core::error::{CityPulseError, Result};
use citypulse_core::session::{PersistedSession, SessionSnapshotRepository};

use crate::paths::CityPulsePaths;
use crate::storage::AtomicJsonFile;

/// Stores the session snapshot as `auth-storage.json`.
///
/// A file that cannot be parsed is treated as absent and replaced on the next
/// save.
#[derive(Debug, Clone)]
pub struct FileSessionSnapshotRepository {
    file: AtomicJsonFile<PersistedSession>,
}

impl FileSessionSnapshotRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Repository at the default location under `paths`.
    pub fn from_paths(paths: &CityPulsePaths) -> Self {
        Self::new(paths.session_file())
    }

    async fn blocking<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(AtomicJsonFile<PersistedSession>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || op(file))
            .await
            .map_err(|e| CityPulseError::internal(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl SessionSnapshotRepository for FileSessionSnapshotRepository {
    async fn load(&self) -> Result<Option<PersistedSession>> {
        let path = self.file.path().display().to_string();
        let loaded = self.blocking(|file| file.load()).await;
        match loaded {
            Err(CityPulseError::Serialization { message, .. }) => {
                tracing::warn!(
                    path,
                    error = %message,
                    "[Storage] corrupt session snapshot ignored"
                );
                Ok(None)
            }
            other => other,
        }
    }

    async fn save(&self, snapshot: &PersistedSession) -> Result<()> {
        let snapshot = snapshot.clone();
        self.blocking(move |file| file.save(&snapshot)).await?;
        tracing::debug!("[Storage] session snapshot saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.blocking(|file| file.remove()).await?;
        tracing::debug!("[Storage] session snapshot cleared");
        Ok(())
    }
}
