//! HTTP status and transport error mapping.

use reqwest::StatusCode;

use citypulse_core::error::CityPulseError;

use super::wire::error_message;

/// Which backend surface produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Surface {
    Auth,
    Rows(&'static str),
    Storage,
}

/// Maps a non-success response into the error taxonomy.
pub(crate) fn map_status(surface: Surface, status: StatusCode, body: &str) -> CityPulseError {
    let message = error_message(body);
    match (surface, status.as_u16()) {
        (Surface::Auth, 400 | 401 | 403 | 422) => CityPulseError::auth_rejected(message),
        (Surface::Rows(collection), 404) => CityPulseError::not_found(collection, message),
        (Surface::Storage, 404) => CityPulseError::not_found("object", message),
        (Surface::Rows(_) | Surface::Storage, 401 | 403) => CityPulseError::Unauthenticated,
        (Surface::Rows(_) | Surface::Storage, 400 | 409 | 413 | 422) => {
            CityPulseError::invalid_input(message)
        }
        (_, code) => CityPulseError::network(format!("HTTP {code}: {message}")),
    }
}

/// Maps a transport-level failure.
pub(crate) fn map_transport(err: reqwest::Error) -> CityPulseError {
    if err.is_decode() {
        CityPulseError::json(err.to_string())
    } else {
        CityPulseError::network(err.to_string())
    }
}
