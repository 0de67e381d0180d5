//! Location-scoped content feeds.

pub mod model;
pub mod store;

pub use model::{FeedItem, FeedPage, FeedState, VideoPost};
pub use store::{ContentFeedStore, EventFeedStore, VideoFeedStore};
