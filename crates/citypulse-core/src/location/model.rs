//! Location catalog model.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A selectable place. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCatalogEntry {
    pub id: String,
    pub name: String,
    /// Short code (e.g. ISO code for regions that have one).
    #[serde(default)]
    pub code: Option<String>,
    /// Classification tag (`city`, `state`, ...).
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub division1_code: Option<String>,
}

/// Parent-region filters for a bulk catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    pub country_code: Option<String>,
    pub division1_code: Option<String>,
}

impl CatalogFilters {
    pub fn country(code: impl Into<String>) -> Self {
        Self {
            country_code: Some(code.into()),
            division1_code: None,
        }
    }

    pub fn with_division1(mut self, code: impl Into<String>) -> Self {
        self.division1_code = Some(code.into());
        self
    }
}

/// One request of the cursor walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPageRequest {
    pub first: usize,
    /// Cursor returned by the previous page; `None` for the first page.
    pub after: Option<String>,
    pub kind: String,
    pub filters: CatalogFilters,
}

/// One page of the cursor walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub entries: Vec<LocationCatalogEntry>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Free-text search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSearchRequest {
    pub term: String,
    pub limit: usize,
    pub kind: String,
}

/// Observable state of one picker visit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSearchState {
    /// Unfiltered catalog accumulated by the bulk load.
    pub catalog: Vec<LocationCatalogEntry>,
    /// What the list shows: the catalog or the last applied search.
    pub results: Vec<LocationCatalogEntry>,
    /// Last query typed, untrimmed.
    pub query: String,
    pub selected: Option<LocationCatalogEntry>,
    /// A search is in flight.
    pub is_loading: bool,
    /// The bulk catalog walk is in flight.
    pub catalog_loading: bool,
    /// The query is too short to search ("type more").
    pub needs_more_input: bool,
    pub error: Option<crate::error::CityPulseError>,
}
