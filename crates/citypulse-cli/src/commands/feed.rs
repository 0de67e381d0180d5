use anyhow::{Result, bail};

use citypulse_core::events::Event;
use citypulse_core::feed::{EventFeedStore, VideoFeedStore, VideoPost};

use super::App;

pub(super) fn print_events(events: &Vec<Event>) {
    if events.is_empty() {
        println!("No events");
    }
    for event in events {
        let when = event.start_date.as_deref().unwrap_or("date tbd");
        let venue = event.location.as_deref().unwrap_or("");
        println!("[{}] {} - {when} {venue}", event.id, event.name);
    }
}

fn print_videos(videos: &Vec<VideoPost>) {
    if videos.is_empty() {
        println!("No videos");
    }
    for video in videos {
        println!(
            "[{}] {}",
            video.id,
            video.video.as_deref().unwrap_or("(no video)")
        );
    }
}

pub async fn events(app: &App, city: Option<String>) -> Result<()> {
    let backend = app.backend()?;
    let city = match city {
        Some(city) => city,
        None => {
            let session = app.session(&backend).await?;
            match session.current_location() {
                Some(city) => city,
                None => bail!("No city given and none saved. Use --city or `citypulse set-city`."),
            }
        }
    };

    let store = EventFeedStore::new(backend, app.config.client.feed_page_size);
    let page = store.fetch_initial(Some(&city)).await?;
    app.emit(&page.items, print_events)
}

pub async fn videos(app: &App) -> Result<()> {
    let store = VideoFeedStore::new(app.backend()?, app.config.client.feed_page_size);
    let page = store.fetch_initial(None).await?;
    app.emit(&page.items, print_videos)
}
