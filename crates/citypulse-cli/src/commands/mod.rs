pub mod avatar;
pub mod cities;
pub mod events;
pub mod feed;
pub mod session;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::sync::Arc;

use citypulse_core::config::ConfigRoot;
use citypulse_core::session::{Session, SessionStore};
use citypulse_infrastructure::{
    CityPulsePaths, FileSessionSnapshotRepository, OxilorCatalog, SupabaseClient,
};

/// Wires the stores to the real collaborators for one command.
pub struct App {
    paths: CityPulsePaths,
    pub config: ConfigRoot,
    json: bool,
}

impl App {
    pub fn new(paths: CityPulsePaths, config: ConfigRoot, json: bool) -> Self {
        Self {
            paths,
            config,
            json,
        }
    }

    pub fn backend(&self) -> Result<Arc<SupabaseClient>> {
        let client = SupabaseClient::new(&self.config.backend)
            .context("Backend is not configured (set CITYPULSE_BACKEND_URL and _ANON_KEY)")?;
        Ok(Arc::new(client))
    }

    pub fn catalog(&self) -> Result<Arc<OxilorCatalog>> {
        let catalog = OxilorCatalog::new(&self.config.catalog)
            .context("Catalog is not configured (set CITYPULSE_CATALOG_API_KEY)")?;
        Ok(Arc::new(catalog))
    }

    /// A session store restored from disk.
    pub async fn session(&self, backend: &Arc<SupabaseClient>) -> Result<SessionStore> {
        let snapshots = Arc::new(FileSessionSnapshotRepository::from_paths(&self.paths));
        let store = SessionStore::new(backend.clone(), backend.clone(), backend.clone(), snapshots);
        store
            .initialize()
            .await
            .context("Failed to restore session")?;
        Ok(store)
    }

    /// Like [`App::session`] but requires a signed-in user.
    pub async fn signed_in(
        &self,
        backend: &Arc<SupabaseClient>,
    ) -> Result<(SessionStore, Session)> {
        let store = self.session(backend).await?;
        let session = store.snapshot();
        if !session.is_authenticated() {
            bail!("Not signed in. Run `citypulse login <email> --password ...` first.");
        }
        Ok((store, session))
    }

    /// Prints `value` as JSON, or runs `text` for the plain rendering.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}
