//! In-memory collaborators shared by the store tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::blob::{BlobStore, UploadOptions};
use crate::error::{CityPulseError, Result};
use crate::location::{
    CatalogPage, CatalogPageRequest, CatalogSearchRequest, LocationCatalog, LocationCatalogEntry,
};
use crate::rows::{Filter, RowQuery, RowStore};
use crate::session::{
    AuthBackend, AuthResponse, AuthSession, AuthToken, Identity, PersistedSession,
    SessionSnapshotRepository,
};

pub fn auth_session(id: &str) -> AuthSession {
    AuthSession {
        identity: Identity {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
            raw: json!({ "id": id, "aud": "authenticated" }),
        },
        token: AuthToken {
            access_token: format!("access-{id}"),
            refresh_token: Some(format!("refresh-{id}")),
            expires_at: None,
        },
    }
}

pub fn profile_row(id: &str, city: Option<&str>) -> Value {
    json!({
        "id": id,
        "first_name": "Ana",
        "last_name": "Pop",
        "profile_picture": null,
        "city": city,
    })
}

pub fn entry(id: &str, name: &str) -> LocationCatalogEntry {
    LocationCatalogEntry {
        id: id.to_string(),
        name: name.to_string(),
        code: None,
        kind: Some("city".to_string()),
        coordinates: None,
        country_code: Some("RO".to_string()),
        division1_code: None,
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Default)]
pub struct FakeAuth {
    credentials: Mutex<HashMap<(String, String), AuthSession>>,
    sign_ups: Mutex<HashMap<String, (AuthSession, bool)>>,
    valid_session: Mutex<Option<AuthSession>>,
    sign_out_error: Mutex<Option<CityPulseError>>,
    get_session_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    reset_requests: Mutex<Vec<(String, Option<String>)>>,
    password_updates: Mutex<Vec<(String, String)>>,
    password_update_error: Mutex<Option<CityPulseError>>,
}

impl FakeAuth {
    pub fn accept_credentials(&self, email: &str, password: &str, session: AuthSession) {
        self.credentials
            .lock()
            .unwrap()
            .insert((email.to_string(), password.to_string()), session);
    }

    pub fn accept_sign_up(&self, email: &str, session: AuthSession, issue_token: bool) {
        self.sign_ups
            .lock()
            .unwrap()
            .insert(email.to_string(), (session, issue_token));
    }

    pub fn set_valid_session(&self, session: AuthSession) {
        *self.valid_session.lock().unwrap() = Some(session);
    }

    pub fn fail_sign_out(&self, err: CityPulseError) {
        *self.sign_out_error.lock().unwrap() = Some(err);
    }

    pub fn get_session_calls(&self) -> usize {
        self.get_session_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn fail_password_update(&self, err: CityPulseError) {
        *self.password_update_error.lock().unwrap() = Some(err);
    }

    /// `(email, redirect_to)` of every recovery request.
    pub fn reset_requests(&self) -> Vec<(String, Option<String>)> {
        self.reset_requests.lock().unwrap().clone()
    }

    /// `(access_token, new_password)` of every password update.
    pub fn password_updates(&self) -> Vec<(String, String)> {
        self.password_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthResponse> {
        tokio::task::yield_now().await;
        let Some((session, issue_token)) = self.sign_ups.lock().unwrap().get(email).cloned() else {
            return Err(CityPulseError::auth_rejected("User already registered"));
        };
        Ok(AuthResponse {
            identity: Some(session.identity),
            token: issue_token.then_some(session.token),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse> {
        tokio::task::yield_now().await;
        let key = (email.to_string(), password.to_string());
        match self.credentials.lock().unwrap().get(&key).cloned() {
            Some(session) => Ok(AuthResponse {
                identity: Some(session.identity),
                token: Some(session.token),
            }),
            None => Err(CityPulseError::auth_rejected("Invalid login credentials")),
        }
    }

    async fn sign_out(&self, _token: &AuthToken) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match self.sign_out_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_session(&self, _token: &AuthToken) -> Result<Option<AuthSession>> {
        self.get_session_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.valid_session.lock().unwrap().clone())
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<()> {
        tokio::task::yield_now().await;
        self.reset_requests
            .lock()
            .unwrap()
            .push((email.to_string(), redirect_to.map(str::to_string)));
        Ok(())
    }

    async fn update_password(&self, token: &AuthToken, new_password: &str) -> Result<()> {
        tokio::task::yield_now().await;
        if let Some(err) = self.password_update_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.password_updates
            .lock()
            .unwrap()
            .push((token.access_token.clone(), new_password.to_string()));
        Ok(())
    }
}

// ============================================================================
// Rows
// ============================================================================

type Scripted<T> = Mutex<VecDeque<(Duration, Result<T>)>>;

#[derive(Default)]
pub struct FakeRows {
    selects: Scripted<Vec<Value>>,
    inserts: Scripted<Vec<Value>>,
    updates: Scripted<Vec<Value>>,
    deletes: Scripted<()>,
    select_log: Mutex<Vec<RowQuery>>,
    insert_log: Mutex<Vec<(&'static str, Value)>>,
    update_log: Mutex<Vec<(&'static str, Value, Vec<Filter>)>>,
    delete_log: Mutex<Vec<(&'static str, Vec<Filter>)>>,
}

impl FakeRows {
    pub fn push_select(&self, result: Result<Vec<Value>>) {
        self.push_select_delayed(Duration::ZERO, result);
    }

    pub fn push_select_delayed(&self, delay: Duration, result: Result<Vec<Value>>) {
        self.selects.lock().unwrap().push_back((delay, result));
    }

    pub fn push_insert(&self, result: Result<Vec<Value>>) {
        self.inserts.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_update(&self, result: Result<Vec<Value>>) {
        self.updates.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_delete(&self, result: Result<()>) {
        self.deletes.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn selects(&self) -> Vec<RowQuery> {
        self.select_log.lock().unwrap().clone()
    }

    pub fn inserted(&self) -> Vec<(&'static str, Value)> {
        self.insert_log.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(&'static str, Value, Vec<Filter>)> {
        self.update_log.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> usize {
        self.update_log.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<(&'static str, Vec<Filter>)> {
        self.delete_log.lock().unwrap().clone()
    }
}

async fn play<T>(script: &Scripted<T>, fallback: impl FnOnce() -> Result<T>) -> Result<T> {
    let next = script.lock().unwrap().pop_front();
    match next {
        Some((delay, result)) => {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            result
        }
        None => {
            tokio::task::yield_now().await;
            fallback()
        }
    }
}

#[async_trait]
impl RowStore for FakeRows {
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>> {
        self.select_log.lock().unwrap().push(query.clone());
        play(&self.selects, || Ok(Vec::new())).await
    }

    async fn insert(&self, collection: &'static str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.insert_log
            .lock()
            .unwrap()
            .extend(rows.iter().cloned().map(|row| (collection, row)));
        play(&self.inserts, || Ok(rows)).await
    }

    async fn update(
        &self,
        collection: &'static str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>> {
        self.update_log
            .lock()
            .unwrap()
            .push((collection, patch.clone(), filters.to_vec()));
        play(&self.updates, || Ok(vec![patch])).await
    }

    async fn delete(&self, collection: &'static str, filters: &[Filter]) -> Result<()> {
        self.delete_log
            .lock()
            .unwrap()
            .push((collection, filters.to_vec()));
        play(&self.deletes, || Ok(())).await
    }
}

// ============================================================================
// Blobs
// ============================================================================

#[derive(Default)]
pub struct FakeBlobs {
    uploads: Mutex<Vec<(String, String, UploadOptions)>>,
    next_error: Mutex<Option<CityPulseError>>,
}

impl FakeBlobs {
    pub fn fail_next(&self, err: CityPulseError) {
        *self.next_error.lock().unwrap() = Some(err);
    }

    pub fn uploads(&self) -> Vec<(String, String, UploadOptions)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        _bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        if let Some(err) = self.next_error.lock().unwrap().take() {
            return Err(err);
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), options.clone()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://cdn.test/{bucket}/{key}")
    }
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Default)]
pub struct MemorySnapshots {
    stored: Mutex<Option<PersistedSession>>,
    load_error: Mutex<Option<CityPulseError>>,
}

impl MemorySnapshots {
    pub fn preload(&self, snapshot: PersistedSession) {
        *self.stored.lock().unwrap() = Some(snapshot);
    }

    pub fn fail_load(&self, err: CityPulseError) {
        *self.load_error.lock().unwrap() = Some(err);
    }

    pub fn current(&self) -> Option<PersistedSession> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionSnapshotRepository for MemorySnapshots {
    async fn load(&self) -> Result<Option<PersistedSession>> {
        if let Some(err) = self.load_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.current())
    }

    async fn save(&self, snapshot: &PersistedSession) -> Result<()> {
        *self.stored.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// Location catalog
// ============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    pages: Mutex<VecDeque<Result<CatalogPage>>>,
    page_requests: Mutex<Vec<CatalogPageRequest>>,
    searches: Mutex<HashMap<String, (Duration, Result<Vec<LocationCatalogEntry>>)>>,
    search_log: Mutex<Vec<String>>,
    /// When set, the fake ignores cancellation like a transport that
    /// completes anyway.
    ignore_cancel: bool,
    transport_cancels: AtomicUsize,
}

impl FakeCatalog {
    pub fn ignoring_cancellation() -> Self {
        Self {
            ignore_cancel: true,
            ..Self::default()
        }
    }

    pub fn push_page(&self, page: Result<CatalogPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn respond(
        &self,
        term: &str,
        delay: Duration,
        result: Result<Vec<LocationCatalogEntry>>,
    ) {
        self.searches
            .lock()
            .unwrap()
            .insert(term.to_string(), (delay, result));
    }

    pub fn page_requests(&self) -> Vec<CatalogPageRequest> {
        self.page_requests.lock().unwrap().clone()
    }

    pub fn search_terms(&self) -> Vec<String> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn transport_cancels(&self) -> usize {
        self.transport_cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationCatalog for FakeCatalog {
    async fn list_page(&self, request: &CatalogPageRequest) -> Result<CatalogPage> {
        self.page_requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(CityPulseError::internal("unexpected catalog page request"))
        })
    }

    async fn search(
        &self,
        request: &CatalogSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationCatalogEntry>> {
        self.search_log.lock().unwrap().push(request.term.clone());
        let (delay, result) = self
            .searches
            .lock()
            .unwrap()
            .get(&request.term)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(Vec::new())));

        if self.ignore_cancel {
            tokio::time::sleep(delay).await;
            return result;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                self.transport_cancels.fetch_add(1, Ordering::SeqCst);
                Err(CityPulseError::Cancelled)
            }
            _ = tokio::time::sleep(delay) => result,
        }
    }
}
