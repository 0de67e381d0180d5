use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use super::model::{FeedItem, FeedPage, FeedState, VideoPost};
use crate::error::{CityPulseError, Result};
use crate::events::Event;
use crate::rows::{RowQuery, RowStore, decode_rows};
use crate::state::StoreState;

/// Event feed scoped by city.
pub type EventFeedStore = ContentFeedStore<Event>;
/// Unscoped video feed.
pub type VideoFeedStore = ContentFeedStore<VideoPost>;

/// Holds the first page of a content feed.
///
/// Only the newest page is fetched. When the scope changes while a fetch is
/// in flight, the earlier fetch resolves to `Cancelled` and leaves state
/// alone.
pub struct ContentFeedStore<T: FeedItem> {
    state: StoreState<FeedState<T>>,
    rows: Arc<dyn RowStore>,
    page_size: usize,
    generation: AtomicU64,
}

impl<T: FeedItem> ContentFeedStore<T> {
    pub fn new(rows: Arc<dyn RowStore>, page_size: usize) -> Self {
        Self {
            state: StoreState::default(),
            rows,
            page_size,
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> FeedState<T> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState<T>> {
        self.state.subscribe()
    }

    /// Fetches the newest page for `scope`.
    ///
    /// Scoped feeds require a non-empty scope. A failure clears the visible
    /// items and is recorded in state.
    pub async fn fetch_initial(&self, scope: Option<&str>) -> Result<FeedPage<T>> {
        let scope = scope.map(str::trim).filter(|s| !s.is_empty());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
            s.scope = scope.map(str::to_string);
        });

        let result = match self.query(scope) {
            Ok(query) => self.load(&query).await,
            Err(err) => Err(err),
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(collection = T::COLLECTION, "[Feed] discarding superseded page");
            return Err(CityPulseError::Cancelled);
        }

        match result {
            Ok(page) => {
                tracing::info!(
                    collection = T::COLLECTION,
                    count = page.items.len(),
                    "[Feed] page loaded"
                );
                self.state.update(|s| {
                    s.page = page.clone();
                    s.is_loading = false;
                });
                Ok(page)
            }
            Err(err) => {
                tracing::error!(collection = T::COLLECTION, error = %err, "[Feed] fetch failed");
                self.state.update(|s| {
                    s.page = FeedPage::default();
                    s.is_loading = false;
                    s.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    fn query(&self, scope: Option<&str>) -> Result<RowQuery> {
        let query = RowQuery::new(T::COLLECTION)
            .order("created_at", false)
            .limit(self.page_size);
        match (T::SCOPE_COLUMN, scope) {
            (Some(column), Some(scope)) => Ok(query.eq(column, scope)),
            (Some(column), None) => Err(CityPulseError::invalid_input(format!(
                "{} feed requires a {column}",
                T::COLLECTION
            ))),
            (None, _) => Ok(query),
        }
    }

    async fn load(&self, query: &RowQuery) -> Result<FeedPage<T>> {
        let rows = self.rows.select(query).await?;
        let items = decode_rows::<T>(rows)?;
        Ok(FeedPage::new(items, self.page_size))
    }
}
