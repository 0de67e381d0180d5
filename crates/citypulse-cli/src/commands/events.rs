use anyhow::{Context, Result};

use citypulse_core::events::{NewEvent, OwnedEventsStore};

use super::App;
use super::feed::print_events;

/// Event fields as given on the command line.
pub struct Draft {
    pub name: String,
    pub start: String,
    pub end: String,
    pub location: String,
    pub city: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

pub async fn mine(app: &App) -> Result<()> {
    let backend = app.backend()?;
    let (_, session) = app.signed_in(&backend).await?;
    let organizer_id = session.identity_id().context("session has no identity")?;

    let store = OwnedEventsStore::new(backend.clone());
    let events = store.load_owned(organizer_id).await?;
    app.emit(&events, print_events)
}

pub async fn add(app: &App, draft: Draft) -> Result<()> {
    let backend = app.backend()?;
    let (_, session) = app.signed_in(&backend).await?;
    let organizer_id = session
        .identity_id()
        .context("session has no identity")?
        .to_string();
    let city = draft
        .city
        .or_else(|| session.location().map(str::to_string))
        .context("No city given and none saved. Use --city or `citypulse set-city`.")?;

    let store = OwnedEventsStore::new(backend.clone());
    let event = store
        .add_event(NewEvent {
            name: draft.name,
            start_date: draft.start,
            end_date: draft.end,
            location: draft.location,
            city,
            organizer_id,
            website: draft.website,
            description: draft.description,
        })
        .await?;
    app.emit(&event, |event| println!("Created event {} ({})", event.name, event.id))
}

pub async fn delete(app: &App, id: &str) -> Result<()> {
    let backend = app.backend()?;
    app.signed_in(&backend).await?;

    let store = OwnedEventsStore::new(backend.clone());
    store.delete_event(id).await?;
    println!("Deleted event {id}");
    Ok(())
}
