use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::model::{CatalogPage, CatalogPageRequest, CatalogSearchRequest, LocationCatalogEntry};
use crate::error::Result;

/// Remote location catalog, too large to fetch in one call.
#[async_trait]
pub trait LocationCatalog: Send + Sync {
    /// Fetches one page of the cursor walk.
    async fn list_page(&self, request: &CatalogPageRequest) -> Result<CatalogPage>;

    /// Free-text search.
    ///
    /// Implementations must stop the transport and return `Cancelled` as soon
    /// as `cancel` fires.
    async fn search(
        &self,
        request: &CatalogSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationCatalogEntry>>;
}
