//! Session management: identity, credential persistence and profile.

pub mod auth;
pub mod avatar;
pub mod model;
pub mod repository;
pub mod store;

pub use auth::AuthBackend;
pub use avatar::ProfilePictureUpload;
pub use model::{
    AuthResponse, AuthSession, AuthToken, Identity, PersistedSession, Profile, Session,
    SessionStatus, SignUpProfile,
};
pub use repository::{SESSION_STORAGE_KEY, SessionSnapshotRepository};
pub use store::{MIN_PASSWORD_LEN, SessionStore, SignOutReport, SignUpOutcome};
