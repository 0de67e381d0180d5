//! Catalog API response shapes.

use serde::Deserialize;

use citypulse_core::location::{CatalogPage, GeoPoint, LocationCatalogEntry};

/// Region node of the bulk listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNode {
    id: String,
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    division1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: ListNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

/// `{edges: [{node}], pageInfo: {hasNextPage, endCursor}}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    edges: Vec<Edge>,
    #[serde(default)]
    page_info: Option<PageInfo>,
}

impl From<ListResponse> for CatalogPage {
    fn from(response: ListResponse) -> Self {
        let page_info = response.page_info.unwrap_or_default();
        CatalogPage {
            entries: response
                .edges
                .into_iter()
                .map(|edge| {
                    let n = edge.node;
                    LocationCatalogEntry {
                        id: n.id,
                        name: n.name,
                        code: n.code,
                        kind: n.kind,
                        coordinates: coordinates(n.latitude, n.longitude),
                        country_code: n.country,
                        division1_code: n.division1,
                    }
                })
                .collect(),
            has_next_page: page_info.has_next_page,
            end_cursor: page_info.end_cursor,
        }
    }
}

/// Flat node of the search endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchNode {
    id: String,
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    division1_code: Option<String>,
}

impl From<SearchNode> for LocationCatalogEntry {
    fn from(n: SearchNode) -> Self {
        LocationCatalogEntry {
            id: n.id,
            name: n.name,
            code: n.code,
            kind: n.kind,
            coordinates: coordinates(n.latitude, n.longitude),
            country_code: n.country_code,
            division1_code: n.division1_code,
        }
    }
}

fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}
