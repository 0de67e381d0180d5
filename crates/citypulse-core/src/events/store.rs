use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use super::model::{Event, NewEvent};
use crate::error::{CityPulseError, Result};
use crate::rows::{EVENTS, Filter, RowQuery, RowStore, decode_rows};
use crate::state::StoreState;

/// Events created by one organizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedEventsState {
    pub organizer_id: Option<String>,
    /// Newest first as loaded; additions are appended.
    pub events: Vec<Event>,
    pub is_loading: bool,
    pub error: Option<CityPulseError>,
}

/// Organizer tools: list, create and delete one's own events.
pub struct OwnedEventsStore {
    state: StoreState<OwnedEventsState>,
    rows: Arc<dyn RowStore>,
    action_lock: Mutex<()>,
}

impl OwnedEventsStore {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self {
            state: StoreState::default(),
            rows,
            action_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> OwnedEventsState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<OwnedEventsState> {
        self.state.subscribe()
    }

    pub async fn load_owned(&self, organizer_id: &str) -> Result<Vec<Event>> {
        let _guard = self.action_lock.lock().await;
        self.begin();

        let query = RowQuery::new(EVENTS)
            .eq("organizer_id", organizer_id)
            .order("created_at", false);
        let result = match self.rows.select(&query).await {
            Ok(rows) => decode_rows::<Event>(rows),
            Err(err) => Err(err),
        };

        match result {
            Ok(events) => {
                tracing::info!(organizer_id, count = events.len(), "[Events] owned events loaded");
                self.state.update(|s| {
                    s.organizer_id = Some(organizer_id.to_string());
                    s.events = events.clone();
                    s.is_loading = false;
                });
                Ok(events)
            }
            Err(err) => Err(self.fail("load", err)),
        }
    }

    /// Inserts the event and appends the stored row.
    pub async fn add_event(&self, draft: NewEvent) -> Result<Event> {
        let _guard = self.action_lock.lock().await;
        if let Err(err) = draft.validate() {
            return Err(self.fail("add", err));
        }
        self.begin();

        let result = async {
            let row = serde_json::to_value(&draft)?;
            let stored = self.rows.insert(EVENTS, vec![row]).await?;
            decode_rows::<Event>(stored)?
                .into_iter()
                .next()
                .ok_or_else(|| CityPulseError::internal("insert returned no event row"))
        }
        .await;

        match result {
            Ok(event) => {
                tracing::info!(event_id = %event.id, "[Events] event created");
                self.state.update(|s| {
                    s.events.push(event.clone());
                    s.is_loading = false;
                });
                Ok(event)
            }
            Err(err) => Err(self.fail("add", err)),
        }
    }

    /// Deletes by id. The list changes only when the backend confirms.
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        let _guard = self.action_lock.lock().await;
        self.begin();

        match self.rows.delete(EVENTS, &[Filter::eq("id", event_id)]).await {
            Ok(()) => {
                tracing::info!(event_id, "[Events] event deleted");
                self.state.update(|s| {
                    s.events.retain(|event| event.id != event_id);
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(err) => Err(self.fail("delete", err)),
        }
    }

    fn begin(&self) {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn fail(&self, action: &str, err: CityPulseError) -> CityPulseError {
        tracing::error!(action, error = %err, "[Events] action failed");
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(err.clone());
        });
        err
    }
}
