//! Row-query surface of the remote backend.
//!
//! The backend exposes parameterized `select`/`insert`/`update`/`delete`
//! operations against named collections. Stores build a [`RowQuery`] and
//! decode the returned JSON rows into their own models.

use async_trait::async_trait;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CityPulseError, Result};

/// Profile rows keyed by identity id.
pub const USERS: &str = "users";
/// Event rows.
pub const EVENTS: &str = "events";
/// Video feed rows.
pub const VIDEO_FEED: &str = "video_feed";

/// Equality filter on a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A parameterized select against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub collection: &'static str,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl RowQuery {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row storage exposed by the backend.
///
/// Implementations map transport failures to `NetworkFailure` and missing
/// rows to `NotFound`; they never retry.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Runs a select and returns the matching rows in server order.
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>>;

    /// Inserts rows and returns them as stored by the server.
    async fn insert(&self, collection: &'static str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Applies `patch` to every row matching `filters`; returns the updated rows.
    async fn update(
        &self,
        collection: &'static str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>>;

    /// Deletes every row matching `filters`.
    async fn delete(&self, collection: &'static str, filters: &[Filter]) -> Result<()>;

    /// Select expecting exactly one row.
    async fn select_single(&self, query: &RowQuery) -> Result<Value> {
        let query = query.clone().limit(1);
        let rows = self.select(&query).await?;
        rows.into_iter().next().ok_or_else(|| {
            let id = query
                .filters
                .first()
                .map(|f| f.value.clone())
                .unwrap_or_default();
            CityPulseError::not_found(query.collection, id)
        })
    }
}

/// Decodes rows into a typed model.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(CityPulseError::from))
        .collect()
}

/// Accepts numeric or string row ids and normalizes them to strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    #[test]
    fn test_query_builder() {
        let query = RowQuery::new(EVENTS)
            .eq("city", "Cluj")
            .order("created_at", false)
            .limit(20);
        assert_eq!(query.collection, "events");
        assert_eq!(query.filters, vec![Filter::eq("city", "Cluj")]);
        assert_eq!(
            query.order,
            Some(Order {
                column: "created_at".into(),
                ascending: false
            })
        );
        assert_eq!(query.limit, Some(20));
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let rows: Vec<Row> = decode_rows(vec![json!({"id": 42}), json!({"id": "abc"})]).unwrap();
        assert_eq!(rows[0].id, "42");
        assert_eq!(rows[1].id, "abc");
    }

    #[test]
    fn test_decode_rows_reports_serialization_error() {
        let err = decode_rows::<Row>(vec![json!({"id": null})]).unwrap_err();
        assert!(matches!(err, CityPulseError::Serialization { .. }));
    }
}
