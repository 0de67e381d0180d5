//! Event model.

use serde::{Deserialize, Serialize};

use crate::error::{CityPulseError, Result};
use crate::rows::deserialize_id;

/// A row of the `events` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Venue / address line.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub refund_policy: Option<String>,
    #[serde(default, alias = "user_id")]
    pub organizer_id: Option<String>,
    /// Server timestamp, used for recency ordering.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields an organizer supplies when creating an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewEvent {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub city: String,
    pub organizer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("city", &self.city),
            ("organizer_id", &self.organizer_id),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(CityPulseError::invalid_input(format!(
                "event {field} is required"
            ))),
            None => Ok(()),
        }
    }
}
