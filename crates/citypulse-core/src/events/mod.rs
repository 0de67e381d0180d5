//! Event rows and organizer tools.

pub mod model;
pub mod store;

pub use model::{Event, NewEvent};
pub use store::{OwnedEventsState, OwnedEventsStore};
