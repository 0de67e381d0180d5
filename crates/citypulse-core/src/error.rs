//! Error types for the CityPulse client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every store and collaborator.
///
/// Store actions never let an error escape untyped: remote failures are
/// converted into one of these variants, recorded in the store's state and
/// returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CityPulseError {
    /// Transport-level failure. The user may retry by re-triggering the action.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The backend refused the credentials (wrong password, duplicate account).
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// The action requires an authenticated session.
    #[error("No authenticated session")]
    Unauthenticated,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The request was superseded or abandoned on purpose.
    #[error("Request cancelled")]
    Cancelled,

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied something unusable (empty upload, bad base64, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CityPulseError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NetworkFailure error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure(message.into())
    }

    /// Creates an AuthRejected error
    pub fn auth_rejected(message: impl Into<String>) -> Self {
        Self::AuthRejected(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a JSON serialization error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Cancelled error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a network failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }

    /// Check if the backend rejected the credentials
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::AuthRejected(_))
    }

    /// Check if this is an Unauthenticated error
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Whether this error should reach a user-visible error field.
    ///
    /// Cancellation is intentional and is never shown.
    pub fn is_user_visible(&self) -> bool {
        !self.is_cancelled()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CityPulseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CityPulseError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<toml::de::Error> for CityPulseError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CityPulseError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<base64::DecodeError> for CityPulseError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidInput(format!("invalid base64 payload: {err}"))
    }
}

/// A type alias for `Result<T, CityPulseError>`.
pub type Result<T> = std::result::Result<T, CityPulseError>;
