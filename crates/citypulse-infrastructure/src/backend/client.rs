//! HTTP client for the hosted backend (auth, rows, storage).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use citypulse_core::blob::{BlobStore, UploadOptions};
use citypulse_core::config::BackendConfig;
use citypulse_core::error::{CityPulseError, Result};
use citypulse_core::rows::{Filter, RowQuery, RowStore};
use citypulse_core::session::{AuthBackend, AuthResponse, AuthSession, AuthToken};

use super::error::{Surface, map_status, map_transport};
use super::wire::{
    PasswordChange, PasswordCredentials, RecoveryRequest, RefreshGrant, decode_auth_response,
    decode_session, filter_params, identity_from_user, recover_params, select_params,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One client for the three backend surfaces.
///
/// Row and storage requests are authorized with the access token of the
/// current session, tracked here as auth calls succeed, or with the anon key
/// when nobody is signed in.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    /// Builds the client from configuration.
    ///
    /// Fails with `Config` when the URL or anon key is missing.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CityPulseError::config("backend URL is missing"))?;
        let anon_key = config
            .anon_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CityPulseError::config("backend anon key is missing"))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CityPulseError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{collection}", self.base_url)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{key}", self.base_url)
    }

    fn set_access_token(&self, token: Option<&AuthToken>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token.map(|t| t.access_token.clone());
    }

    fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        format!("Bearer {token}")
    }

    /// Adds the api key and the session (or anon) bearer.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    async fn send(&self, surface: Surface, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = map_status(surface, status, &body);
        tracing::debug!(
            ?surface,
            status = status.as_u16(),
            error = %err,
            "[Backend] request failed"
        );
        Err(err)
    }

    async fn send_json(&self, surface: Surface, request: RequestBuilder) -> Result<Value> {
        let response = self.send(surface, request).await?;
        let text = response.text().await.map_err(map_transport)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password });
        let body = self.send_json(Surface::Auth, request).await?;
        decode_auth_response(body, now_unix())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<AuthSession>> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&RefreshGrant { refresh_token });
        match self.send_json(Surface::Auth, request).await {
            Ok(body) => decode_session(body, now_unix()).map(Some),
            Err(err) if err.is_auth_rejected() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn rows_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password });
        let body = self.send_json(Surface::Auth, request).await?;
        let response = decode_auth_response(body, now_unix())?;
        if response.token.is_some() {
            self.set_access_token(response.token.as_ref());
        }
        Ok(response)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let response = self.password_grant(email, password).await?;
        self.set_access_token(response.token.as_ref());
        Ok(response)
    }

    async fn sign_out(&self, token: &AuthToken) -> Result<()> {
        let request = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token.access_token);
        // The local token is dropped whatever the server says.
        self.set_access_token(None);
        self.send(Surface::Auth, request).await?;
        Ok(())
    }

    async fn get_session(&self, token: &AuthToken) -> Result<Option<AuthSession>> {
        if !token.is_expired_at(chrono::Utc::now()) {
            let request = self
                .client
                .get(self.auth_url("user"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&token.access_token);
            match self.send_json(Surface::Auth, request).await {
                Ok(user) => {
                    let session = AuthSession {
                        identity: identity_from_user(user)?,
                        token: token.clone(),
                    };
                    self.set_access_token(Some(&session.token));
                    return Ok(Some(session));
                }
                Err(err) if err.is_auth_rejected() => {
                    tracing::debug!("[Backend] access token rejected, trying refresh");
                }
                Err(err) => return Err(err),
            }
        }

        let Some(refresh_token) = token.refresh_token.as_deref() else {
            return Ok(None);
        };
        let refreshed = self.refresh(refresh_token).await?;
        self.set_access_token(refreshed.as_ref().map(|s| &s.token));
        Ok(refreshed)
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<()> {
        let request = self
            .client
            .post(self.auth_url("recover"))
            .query(&recover_params(redirect_to))
            .header("apikey", &self.anon_key)
            .json(&RecoveryRequest { email });
        self.send(Surface::Auth, request).await?;
        Ok(())
    }

    async fn update_password(&self, token: &AuthToken, new_password: &str) -> Result<()> {
        let request = self
            .client
            .put(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token.access_token)
            .json(&PasswordChange {
                password: new_password,
            });
        self.send(Surface::Auth, request).await?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for SupabaseClient {
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>> {
        let request = self
            .authorized(self.client.get(self.rest_url(query.collection)))
            .query(&select_params(query));
        tracing::debug!(collection = query.collection, "[Backend] select");
        let body = self
            .send_json(Surface::Rows(query.collection), request)
            .await?;
        Ok(rows_of(body))
    }

    async fn insert(&self, collection: &'static str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let request = self
            .authorized(self.client.post(self.rest_url(collection)))
            .header("Prefer", "return=representation")
            .json(&rows);
        tracing::debug!(collection, count = rows.len(), "[Backend] insert");
        let body = self.send_json(Surface::Rows(collection), request).await?;
        Ok(rows_of(body))
    }

    async fn update(
        &self,
        collection: &'static str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>> {
        let request = self
            .authorized(self.client.patch(self.rest_url(collection)))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        tracing::debug!(collection, "[Backend] update");
        let body = self.send_json(Surface::Rows(collection), request).await?;
        Ok(rows_of(body))
    }

    async fn delete(&self, collection: &'static str, filters: &[Filter]) -> Result<()> {
        let request = self
            .authorized(self.client.delete(self.rest_url(collection)))
            .query(&filter_params(filters));
        tracing::debug!(collection, "[Backend] delete");
        self.send(Surface::Rows(collection), request).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<()> {
        let size = bytes.len();
        let request = self
            .authorized(self.client.post(self.object_url(bucket, key)))
            .header("Content-Type", &options.content_type)
            .header("x-upsert", options.upsert.to_string())
            .body(bytes);
        tracing::debug!(bucket, key, size, "[Backend] upload");
        self.send(Surface::Storage, request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }
}
