//! Client-side state layer of CityPulse.
//!
//! Independent stores mediate between UI actions and the remote backend:
//! [`session::SessionStore`], [`location::LocationSearchStore`],
//! [`feed::ContentFeedStore`] and [`events::OwnedEventsStore`]. Each exposes a
//! snapshot, a `watch` subscription and a few async actions. Remote services
//! are reached only through the collaborator traits defined here; concrete
//! clients live in `citypulse-infrastructure`.

pub mod blob;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod location;
pub mod rows;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::{CityPulseError, Result};
