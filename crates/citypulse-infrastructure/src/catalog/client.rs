//! HTTP client for the third-party location catalog.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use citypulse_core::config::CatalogConfig;
use citypulse_core::error::{CityPulseError, Result};
use citypulse_core::location::{
    CatalogPage, CatalogPageRequest, CatalogSearchRequest, LocationCatalog, LocationCatalogEntry,
};

use super::wire::{ListResponse, SearchNode};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog client authorized with a bearer API key.
pub struct OxilorCatalog {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl OxilorCatalog {
    /// Fails with `Config` when no API key is configured; no request is ever
    /// issued without one.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CityPulseError::config("API Key is missing"))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CityPulseError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: config.language.clone(),
        })
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        self.client
            .get(format!("{}/{path}", self.base_url))
            .query(params)
            .bearer_auth(&self.api_key)
            .header("Accept-Language", &self.language)
            .header("Content-Type", "application/json")
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| CityPulseError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CityPulseError::network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CityPulseError::network(e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| CityPulseError::json(format!("Invalid API response format: {e}")))
    }
}

pub(crate) fn page_params(request: &CatalogPageRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![("first", request.first.to_string())];
    if let Some(after) = &request.after {
        params.push(("after", after.clone()));
    }
    params.push(("kind", request.kind.clone()));
    if let Some(country) = &request.filters.country_code {
        params.push(("country", country.clone()));
    }
    if let Some(division1) = &request.filters.division1_code {
        params.push(("division1", division1.clone()));
    }
    params
}

pub(crate) fn search_params(request: &CatalogSearchRequest) -> Vec<(&'static str, String)> {
    vec![
        ("searchTerm", request.term.clone()),
        ("first", request.limit.to_string()),
        ("type", request.kind.clone()),
    ]
}

#[async_trait]
impl LocationCatalog for OxilorCatalog {
    async fn list_page(&self, request: &CatalogPageRequest) -> Result<CatalogPage> {
        let response: ListResponse = self
            .fetch(self.get("regions", &page_params(request)))
            .await?;
        Ok(response.into())
    }

    async fn search(
        &self,
        request: &CatalogSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationCatalogEntry>> {
        let call =
            self.fetch::<Vec<SearchNode>>(self.get("search-regions", &search_params(request)));

        // Dropping the request future aborts the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(term = %request.term, "[Catalog] search aborted");
                Err(CityPulseError::Cancelled)
            }
            result = call => Ok(result?.into_iter().map(LocationCatalogEntry::from).collect()),
        }
    }
}
