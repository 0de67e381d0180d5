//! Session snapshot repository trait.
//!
//! Defines the interface for the durable credential snapshot.

use async_trait::async_trait;

use super::model::PersistedSession;
use crate::error::Result;

/// Fixed storage key of the persisted session.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// An abstract repository for the persisted session snapshot.
///
/// Holds at most one snapshot. Implementations decide the medium (file,
/// keychain, memory).
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Loads the snapshot.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: A snapshot was stored
    /// - `Ok(None)`: Nothing stored
    /// - `Err(_)`: Error occurred during retrieval
    async fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replaces the stored snapshot.
    async fn save(&self, snapshot: &PersistedSession) -> Result<()>;

    /// Removes the snapshot. Succeeds when nothing is stored.
    async fn clear(&self) -> Result<()>;
}
