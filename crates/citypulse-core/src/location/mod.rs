//! Location picker: bulk catalog load and search-as-you-type.

pub mod catalog;
pub mod model;
pub mod store;

pub use catalog::LocationCatalog;
pub use model::{
    CatalogFilters, CatalogPage, CatalogPageRequest, CatalogSearchRequest, GeoPoint,
    LocationCatalogEntry, LocationSearchState,
};
pub use store::{LocationSearchStore, SearchOutcome};
