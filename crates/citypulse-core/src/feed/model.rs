//! Feed model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CityPulseError;
use crate::events::Event;
use crate::rows::{EVENTS, VIDEO_FEED, deserialize_id};

/// A content type a [`ContentFeedStore`](super::ContentFeedStore) can list.
pub trait FeedItem: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the items are read from.
    const COLLECTION: &'static str;
    /// Column matched against the scope key; `None` for unscoped feeds.
    const SCOPE_COLUMN: Option<&'static str>;

    fn id(&self) -> &str;

    fn created_at(&self) -> Option<&str>;
}

impl FeedItem for Event {
    const COLLECTION: &'static str = EVENTS;
    const SCOPE_COLUMN: Option<&'static str> = Some("city");

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// A row of the `video_feed` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPost {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Playable video URL.
    #[serde(default, alias = "video_url")]
    pub video: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FeedItem for VideoPost {
    const COLLECTION: &'static str = VIDEO_FEED;
    const SCOPE_COLUMN: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// A recency-ordered slice of a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    /// Server order, newest first.
    pub items: Vec<T>,
    /// `created_at` of the last item.
    pub end_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: FeedItem> FeedPage<T> {
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        let end_cursor = items
            .last()
            .and_then(|item| item.created_at())
            .map(str::to_string);
        let has_more = page_size > 0 && items.len() == page_size;
        Self {
            items,
            end_cursor,
            has_more,
        }
    }
}

impl<T> Default for FeedPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            end_cursor: None,
            has_more: false,
        }
    }
}

/// Observable state of a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    pub page: FeedPage<T>,
    /// Scope of the visible page.
    pub scope: Option<String>,
    pub is_loading: bool,
    pub error: Option<CityPulseError>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            page: FeedPage::default(),
            scope: None,
            is_loading: false,
            error: None,
        }
    }
}
