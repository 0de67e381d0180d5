use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::catalog::LocationCatalog;
use super::model::{
    CatalogFilters, CatalogPageRequest, CatalogSearchRequest, LocationCatalogEntry,
    LocationSearchState,
};
use crate::config::ClientConfig;
use crate::error::{CityPulseError, Result};
use crate::state::StoreState;

/// How a `search` call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results of this query are now visible.
    Applied { count: usize },
    /// Query too short; nothing was sent.
    TooShort,
    /// Empty query; the unfiltered catalog is visible again.
    Reset,
}

#[derive(Debug, Clone)]
struct SearchSettings {
    page_size: usize,
    max_pages: usize,
    min_search_len: usize,
    kind: String,
    debounce: Duration,
}

impl From<&ClientConfig> for SearchSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.catalog_page_size,
            max_pages: config.catalog_max_pages,
            min_search_len: config.min_search_len,
            kind: config.catalog_kind.clone(),
            debounce: config.search_debounce(),
        }
    }
}

/// The live request of the picker. At most one token exists at a time.
#[derive(Debug, Default)]
struct InFlight {
    generation: u64,
    token: Option<CancellationToken>,
    closed: bool,
}

impl InFlight {
    /// Cancels the live token and makes any pending resolution stale.
    fn invalidate(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.generation += 1;
    }
}

/// Incremental, cancellable lookup over the location catalog.
///
/// One instance per picker visit. Results are applied on a
/// last-issued-wins basis: each search bumps a generation counter and
/// cancels the previous token, and a resolution whose generation is no
/// longer current is discarded without touching state.
pub struct LocationSearchStore {
    state: StoreState<LocationSearchState>,
    catalog: Arc<dyn LocationCatalog>,
    settings: SearchSettings,
    in_flight: Mutex<InFlight>,
    debounce_ticket: AtomicU64,
}

impl LocationSearchStore {
    pub fn new(catalog: Arc<dyn LocationCatalog>, config: &ClientConfig) -> Self {
        Self {
            state: StoreState::default(),
            catalog,
            settings: SearchSettings::from(config),
            in_flight: Mutex::new(InFlight::default()),
            debounce_ticket: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> LocationSearchState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationSearchState> {
        self.state.subscribe()
    }

    /// Walks the catalog pages and stores the accumulated entries.
    ///
    /// Stops when the server reports no next page or after the configured
    /// page bound. Not cancellable. The visible results are replaced only
    /// while no query is active.
    pub async fn fetch_catalog(&self, filters: CatalogFilters) -> Result<usize> {
        self.state.update(|s| {
            s.catalog_loading = true;
            s.error = None;
        });

        match self.walk_catalog(&filters).await {
            Ok(entries) => {
                let count = entries.len();
                tracing::info!(count, "[LocationSearch] catalog loaded");
                self.state.update(|s| {
                    if s.query.trim().is_empty() {
                        s.results = entries.clone();
                    }
                    s.catalog = entries;
                    s.catalog_loading = false;
                });
                Ok(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "[LocationSearch] catalog load failed");
                self.state.update(|s| {
                    s.catalog_loading = false;
                    s.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    /// Runs a search for `term` right away.
    ///
    /// Returns `Err(Cancelled)` when a newer search, a reset or `close`
    /// superseded this one before it resolved; state is untouched then.
    pub async fn search(&self, term: &str) -> Result<SearchOutcome> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            self.reset_filter();
            return Ok(SearchOutcome::Reset);
        }

        if trimmed.chars().count() < self.settings.min_search_len {
            // The older request must not land under the shorter query.
            let mut in_flight = self.lock_in_flight();
            in_flight.invalidate();
            self.state.update(|s| {
                s.query = term.to_string();
                s.needs_more_input = true;
                s.is_loading = false;
            });
            return Ok(SearchOutcome::TooShort);
        }

        let (generation, token) = {
            let mut in_flight = self.lock_in_flight();
            if in_flight.closed {
                return Err(CityPulseError::Cancelled);
            }
            in_flight.invalidate();
            let token = CancellationToken::new();
            in_flight.token = Some(token.clone());
            self.state.update(|s| {
                s.query = term.to_string();
                s.needs_more_input = false;
                s.is_loading = true;
                s.error = None;
            });
            (in_flight.generation, token)
        };

        let request = CatalogSearchRequest {
            term: trimmed.to_string(),
            limit: self.settings.page_size,
            kind: self.settings.kind.clone(),
        };
        tracing::debug!(term = trimmed, generation, "[LocationSearch] searching");
        let result = self.catalog.search(&request, &token).await;

        let mut in_flight = self.lock_in_flight();
        if in_flight.closed || in_flight.generation != generation {
            tracing::debug!(term = trimmed, "[LocationSearch] discarding superseded result");
            return Err(CityPulseError::Cancelled);
        }
        in_flight.token = None;

        match result {
            Ok(entries) => {
                let count = entries.len();
                self.state.update(|s| {
                    s.results = entries;
                    s.is_loading = false;
                    s.error = None;
                });
                Ok(SearchOutcome::Applied { count })
            }
            Err(err) => {
                if err.is_user_visible() {
                    tracing::error!(term = trimmed, error = %err, "[LocationSearch] search failed");
                }
                self.state.update(|s| {
                    s.is_loading = false;
                    if err.is_user_visible() {
                        s.error = Some(err.clone());
                    }
                });
                Err(err)
            }
        }
    }

    /// Waits for the debounce window, then searches unless a newer debounced
    /// call arrived meanwhile (that call resolves to `Cancelled`).
    pub async fn search_debounced(&self, term: &str) -> Result<SearchOutcome> {
        let ticket = self.debounce_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.settings.debounce).await;

        if self.debounce_ticket.load(Ordering::SeqCst) != ticket {
            return Err(CityPulseError::Cancelled);
        }
        self.search(term).await
    }

    /// Cancels any in-flight search and shows the unfiltered catalog.
    pub fn reset_filter(&self) {
        let mut in_flight = self.lock_in_flight();
        in_flight.invalidate();
        self.debounce_ticket.fetch_add(1, Ordering::SeqCst);
        self.state.update(|s| {
            s.results = s.catalog.clone();
            s.query.clear();
            s.is_loading = false;
            s.needs_more_input = false;
            s.error = None;
        });
    }

    pub fn select(&self, entry: LocationCatalogEntry) {
        tracing::info!(id = %entry.id, name = %entry.name, "[LocationSearch] selected");
        self.state.update(|s| s.selected = Some(entry));
    }

    /// Ends the picker visit: the outstanding request is cancelled at the
    /// transport and any later resolution is dropped.
    pub fn close(&self) {
        let mut in_flight = self.lock_in_flight();
        in_flight.invalidate();
        in_flight.closed = true;
        self.debounce_ticket.fetch_add(1, Ordering::SeqCst);
        self.state.update(|s| s.is_loading = false);
        tracing::debug!("[LocationSearch] closed");
    }

    async fn walk_catalog(&self, filters: &CatalogFilters) -> Result<Vec<LocationCatalogEntry>> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.settings.max_pages {
            let request = CatalogPageRequest {
                first: self.settings.page_size,
                after: cursor.take(),
                kind: self.settings.kind.clone(),
                filters: filters.clone(),
            };
            let page = self.catalog.list_page(&request).await?;
            tracing::debug!(
                page = page_number,
                count = page.entries.len(),
                has_next = page.has_next_page,
                "[LocationSearch] catalog page"
            );

            entries.extend(
                page.entries
                    .into_iter()
                    .filter(|entry| seen.insert(entry.id.clone())),
            );

            if !page.has_next_page {
                return Ok(entries);
            }
            match page.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    tracing::warn!("[LocationSearch] next page announced without a cursor");
                    return Ok(entries);
                }
            }
        }

        tracing::warn!(
            max_pages = self.settings.max_pages,
            "[LocationSearch] page bound reached, catalog truncated"
        );
        Ok(entries)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
