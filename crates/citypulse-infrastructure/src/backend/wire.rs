//! Wire formats of the backend's auth and row endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use citypulse_core::error::{CityPulseError, Result};
use citypulse_core::rows::{Filter, RowQuery};
use citypulse_core::session::{AuthResponse, AuthSession, AuthToken, Identity};

#[derive(Debug, Serialize)]
pub(crate) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// Body of `POST /recover`.
#[derive(Debug, Serialize)]
pub(crate) struct RecoveryRequest<'a> {
    pub email: &'a str,
}

/// Body of `PUT /user` when only the password changes.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordChange<'a> {
    pub password: &'a str,
}

/// Query of `POST /recover`; the link in the mail leads to `redirect_to`.
pub(crate) fn recover_params(redirect_to: Option<&str>) -> Vec<(&'static str, String)> {
    redirect_to
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| ("redirect_to", url.to_string()))
        .into_iter()
        .collect()
}

/// Session object returned by the token and sign-up endpoints.
#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<Value>,
}

/// Decodes a sign-up or sign-in response.
///
/// Sign-up returns the bare user object while email confirmation is pending,
/// and a full session otherwise.
pub(crate) fn decode_auth_response(body: Value, now_unix: i64) -> Result<AuthResponse> {
    if body.get("access_token").is_some() {
        let session: WireSession = serde_json::from_value(body)?;
        let identity = session.user.clone().map(identity_from_user).transpose()?;
        let token = token_from(&session, now_unix);
        return Ok(AuthResponse {
            identity,
            token: Some(token),
        });
    }

    if let Some(user) = body.get("user").filter(|user| !user.is_null()) {
        return Ok(AuthResponse {
            identity: Some(identity_from_user(user.clone())?),
            token: None,
        });
    }

    if body.get("id").is_some() {
        return Ok(AuthResponse {
            identity: Some(identity_from_user(body)?),
            token: None,
        });
    }

    Err(CityPulseError::json("auth response carries neither session nor user"))
}

/// Decodes a refreshed session; both identity and token must be present.
pub(crate) fn decode_session(body: Value, now_unix: i64) -> Result<AuthSession> {
    decode_auth_response(body, now_unix)?
        .into_session()
        .ok_or_else(|| CityPulseError::json("session response is missing the user"))
}

pub(crate) fn identity_from_user(user: Value) -> Result<Identity> {
    let id = user
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CityPulseError::json("user object has no id"))?
        .to_string();
    let email = user
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Identity {
        id,
        email,
        raw: user,
    })
}

fn token_from(session: &WireSession, now_unix: i64) -> AuthToken {
    AuthToken {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
        expires_at: session
            .expires_at
            .or_else(|| session.expires_in.map(|secs| now_unix + secs)),
    }
}

/// Pulls a human-readable message out of an error body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Query parameters of a row select.
pub(crate) fn select_params(query: &RowQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

pub(crate) fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| (filter.column.clone(), format!("eq.{}", filter.value)))
        .collect()
}
