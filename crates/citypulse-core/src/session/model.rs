//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::CityPulseError;
use crate::rows::deserialize_id;

/// The authenticated identity as returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Raw provider record, kept verbatim.
    #[serde(default)]
    pub raw: Value,
}

/// Credential issued by the auth provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl AuthToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now.timestamp())
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identity and token together, as handed out by a successful auth call.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub identity: Identity,
    pub token: AuthToken,
}

/// Response of sign-up / sign-in.
///
/// Sign-up may return an identity without a token when email confirmation is
/// pending.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResponse {
    pub identity: Option<Identity>,
    pub token: Option<AuthToken>,
}

impl AuthResponse {
    pub fn into_session(self) -> Option<AuthSession> {
        match (self.identity, self.token) {
            (Some(identity), Some(token)) => Some(AuthSession { identity, token }),
            _ => None,
        }
    }
}

/// Enriched profile from the `users` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Home city.
    #[serde(default)]
    pub city: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

/// Optional profile fields collected at sign-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
    Error,
}

/// The client's record of who is using the app.
///
/// `status == Authenticated` holds exactly when both `identity` and `token`
/// are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub token: Option<AuthToken>,
    pub last_error: Option<CityPulseError>,
    /// Non-blocking notice, e.g. a remote sign-out that could not be confirmed.
    pub warning: Option<String>,
}

impl Session {
    pub fn authenticated(auth: AuthSession, profile: Option<Profile>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            identity: Some(auth.identity),
            profile,
            token: Some(auth.token),
            last_error: None,
            warning: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
            && self.identity.is_some()
            && self.token.is_some()
    }

    /// Whether initialization has already reached a stable outcome.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Authenticated | SessionStatus::Anonymous
        )
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// The location content feeds are scoped by.
    pub fn location(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|profile| profile.city.as_deref())
    }
}

/// The durable part of a session: identity and token, never the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub identity: Identity,
    pub token: AuthToken,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn from_auth(auth: &AuthSession) -> Self {
        Self {
            identity: auth.identity.clone(),
            token: auth.token.clone(),
            saved_at: Utc::now(),
        }
    }
}
