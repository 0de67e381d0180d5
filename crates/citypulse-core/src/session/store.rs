use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use super::auth::AuthBackend;
use super::avatar::ProfilePictureUpload;
use super::model::{
    AuthSession, PersistedSession, Profile, Session, SessionStatus, SignUpProfile,
};
use super::repository::SessionSnapshotRepository;
use crate::blob::{AVATAR_BUCKET, BlobStore, UploadOptions};
use crate::error::{CityPulseError, Result};
use crate::rows::{Filter, RowQuery, RowStore, USERS};
use crate::state::StoreState;

/// Shortest password the backend accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Outcome of a sign-up that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    /// The account exists but no token was issued yet.
    ConfirmationPending { email: String },
}

/// What went wrong remotely during a sign-out that still succeeded locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignOutReport {
    pub remote_error: Option<CityPulseError>,
    pub storage_error: Option<CityPulseError>,
}

impl SignOutReport {
    pub fn is_clean(&self) -> bool {
        self.remote_error.is_none() && self.storage_error.is_none()
    }

    fn warning(&self) -> Option<String> {
        let parts: Vec<String> = [&self.remote_error, &self.storage_error]
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect();
        (!parts.is_empty()).then(|| format!("Signed out locally; {}", parts.join("; ")))
    }
}

/// Single source of truth for who is using the app.
///
/// Owns the session, its enriched profile and the persisted credential
/// snapshot. All actions are serialized through one lock, so concurrent calls
/// observe each other's terminal state instead of interleaving.
pub struct SessionStore {
    state: StoreState<Session>,
    auth: Arc<dyn AuthBackend>,
    rows: Arc<dyn RowStore>,
    blobs: Arc<dyn BlobStore>,
    snapshots: Arc<dyn SessionSnapshotRepository>,
    action_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        rows: Arc<dyn RowStore>,
        blobs: Arc<dyn BlobStore>,
        snapshots: Arc<dyn SessionSnapshotRepository>,
    ) -> Self {
        Self {
            state: StoreState::new(Session::default()),
            auth,
            rows,
            blobs,
            snapshots,
            action_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Current feed scope, if the profile carries one.
    pub fn current_location(&self) -> Option<String> {
        self.state.read(|s| s.location().map(str::to_string))
    }

    /// Restores the persisted session and verifies it remotely.
    ///
    /// Repeated calls after a settled outcome return the current state without
    /// touching the network. A previous `Error` outcome is retried.
    pub async fn initialize(&self) -> Result<Session> {
        let _guard = self.action_lock.lock().await;

        let current = self.state.snapshot();
        if current.is_settled() {
            tracing::debug!(status = ?current.status, "[Session] already initialized");
            return Ok(current);
        }

        self.state.update(|s| {
            s.status = SessionStatus::Loading;
            s.last_error = None;
        });

        match self.restore().await {
            Ok(Some(auth)) => {
                let profile = self.enrich(&auth.identity.id).await;
                tracing::info!(
                    identity_id = %auth.identity.id,
                    has_profile = profile.is_some(),
                    "[Session] restored session"
                );
                self.state.replace(Session::authenticated(auth, profile));
            }
            Ok(None) => {
                tracing::info!("[Session] no valid session, continuing anonymously");
                self.state.replace(Session::anonymous());
            }
            Err(err) => {
                tracing::error!(error = %err, "[Session] initialization failed");
                self.state.replace(Session {
                    status: SessionStatus::Error,
                    last_error: Some(err.clone()),
                    ..Session::default()
                });
                return Err(err);
            }
        }

        Ok(self.state.snapshot())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let _guard = self.action_lock.lock().await;
        let prior = self.begin_auth_attempt();

        let result = self
            .auth
            .sign_in_with_password(email, password)
            .await
            .and_then(|response| {
                response
                    .into_session()
                    .ok_or_else(|| CityPulseError::auth_rejected("Login failed"))
            });

        match result {
            Ok(auth) => Ok(self.establish(auth).await),
            Err(err) => Err(self.reject_auth_attempt(prior, err, "sign-in")),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.sign_up_with_profile(email, password, SignUpProfile::default())
            .await
    }

    /// Creates the account and its profile row.
    ///
    /// A failing profile-row insert is downgraded to a warning: the account
    /// already exists at that point.
    pub async fn sign_up_with_profile(
        &self,
        email: &str,
        password: &str,
        details: SignUpProfile,
    ) -> Result<SignUpOutcome> {
        let _guard = self.action_lock.lock().await;
        let prior = self.begin_auth_attempt();

        let response = match self.auth.sign_up(email, password).await {
            Ok(response) => response,
            Err(err) => return Err(self.reject_auth_attempt(prior, err, "sign-up")),
        };

        let Some(identity) = response.identity.clone() else {
            let err = CityPulseError::auth_rejected("User not created");
            return Err(self.reject_auth_attempt(prior, err, "sign-up"));
        };

        let profile_row = json!({
            "id": identity.id,
            "first_name": details.first_name,
            "last_name": details.last_name,
            "profile_picture": null,
        });
        if let Err(err) = self.rows.insert(USERS, vec![profile_row]).await {
            tracing::warn!(
                identity_id = %identity.id,
                error = %err,
                "[Session] could not create profile row after sign-up"
            );
        }

        match response.into_session() {
            Some(auth) => Ok(SignUpOutcome::SignedIn(self.establish(auth).await)),
            None => {
                tracing::info!(
                    identity_id = %identity.id,
                    "[Session] sign-up awaiting confirmation"
                );
                self.state.replace(Session::anonymous());
                Ok(SignUpOutcome::ConfirmationPending {
                    email: identity.email.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }

    /// Forgets the session locally, even when the backend cannot be reached.
    ///
    /// Remote and storage failures are reported in the returned
    /// [`SignOutReport`] and as the session's `warning`; they never fail the
    /// call.
    pub async fn sign_out(&self) -> SignOutReport {
        let _guard = self.action_lock.lock().await;

        let token = self.state.read(|s| s.token.clone());
        self.state.update(|s| s.status = SessionStatus::Loading);

        let mut report = SignOutReport::default();
        if let Some(token) = token {
            if let Err(err) = self.auth.sign_out(&token).await {
                tracing::warn!(error = %err, "[Session] remote sign-out failed, clearing locally");
                report.remote_error = Some(err);
            }
        }
        if let Err(err) = self.snapshots.clear().await {
            tracing::warn!(error = %err, "[Session] could not clear persisted session");
            report.storage_error = Some(err);
        }

        let warning = report.warning();
        self.state.replace(Session {
            warning,
            ..Session::anonymous()
        });
        tracing::info!("[Session] signed out");
        report
    }

    /// Asks the backend to mail a password-recovery link to `email`.
    ///
    /// Needs no session and leaves the session untouched. The backend may
    /// answer success for unknown addresses.
    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<()> {
        let _guard = self.action_lock.lock().await;

        let email = email.trim();
        if email.is_empty() {
            return Err(self.record_error(CityPulseError::invalid_input("email is empty")));
        }

        match self.auth.request_password_reset(email, redirect_to).await {
            Ok(()) => {
                tracing::info!("[Session] password recovery link requested");
                self.state.update(|s| s.last_error = None);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "[Session] password recovery request failed");
                Err(self.record_error(err))
            }
        }
    }

    /// Sets a new password for the signed-in user.
    ///
    /// Following a recovery link signs the user in, so this is the second
    /// half of the reset flow as well as a plain password change.
    pub async fn update_password(&self, new_password: &str) -> Result<()> {
        let _guard = self.action_lock.lock().await;
        self.require_identity()?;

        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(self.record_error(CityPulseError::invalid_input(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            ))));
        }
        let Some(token) = self.state.read(|s| s.token.clone()) else {
            return Err(self.record_error(CityPulseError::Unauthenticated));
        };

        match self.auth.update_password(&token, new_password).await {
            Ok(()) => {
                tracing::info!("[Session] password updated");
                self.state.update(|s| s.last_error = None);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "[Session] password update failed");
                Err(self.record_error(err))
            }
        }
    }

    /// Saves a new home location for the signed-in user.
    ///
    /// No optimistic update: the profile changes only after the backend
    /// confirms the write.
    pub async fn set_location(&self, new_location: &str) -> Result<Profile> {
        let _guard = self.action_lock.lock().await;
        let identity_id = self.require_identity()?;

        let city = new_location.trim();
        if city.is_empty() {
            return Err(self.record_error(CityPulseError::invalid_input("location is empty")));
        }

        let result = self
            .rows
            .update(
                USERS,
                json!({ "city": city }),
                &[Filter::eq("id", identity_id.clone())],
            )
            .await
            .and_then(|updated| {
                if updated.is_empty() {
                    Err(CityPulseError::not_found(USERS, identity_id.clone()))
                } else {
                    Ok(())
                }
            });

        if let Err(err) = result {
            tracing::error!(error = %err, "[Session] location update failed");
            return Err(self.record_error(err));
        }

        tracing::info!(city, "[Session] location updated");
        Ok(self.apply_to_profile(&identity_id, |profile| {
            profile.city = Some(city.to_string());
        }))
    }

    /// Uploads a profile picture and links it to the profile row.
    ///
    /// Returns the public URL. State changes only once every step succeeded.
    pub async fn upload_profile_picture(&self, upload: ProfilePictureUpload) -> Result<String> {
        let _guard = self.action_lock.lock().await;
        let identity_id = self.require_identity()?;

        if let Err(err) = upload.validate() {
            return Err(self.record_error(err));
        }

        let key = upload.object_key(&identity_id, chrono::Utc::now().timestamp_millis());
        let options = UploadOptions {
            content_type: upload.resolved_content_type(),
            upsert: true,
        };
        let bytes = upload.bytes;

        let result = async {
            self.blobs
                .upload(AVATAR_BUCKET, &key, bytes, &options)
                .await?;
            let public_url = self.blobs.public_url(AVATAR_BUCKET, &key);
            let updated = self
                .rows
                .update(
                    USERS,
                    json!({ "profile_picture": public_url }),
                    &[Filter::eq("id", identity_id.clone())],
                )
                .await?;
            if updated.is_empty() {
                return Err(CityPulseError::not_found(USERS, identity_id.clone()));
            }
            Ok::<_, CityPulseError>(public_url)
        }
        .await;

        match result {
            Ok(public_url) => {
                tracing::info!(key = %key, "[Session] profile picture uploaded");
                self.apply_to_profile(&identity_id, |profile| {
                    profile.profile_picture = Some(public_url.clone());
                });
                Ok(public_url)
            }
            Err(err) => {
                tracing::error!(error = %err, "[Session] profile picture upload failed");
                Err(self.record_error(err))
            }
        }
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(persisted) = self.snapshots.load().await? else {
            return Ok(None);
        };

        match self.auth.get_session(&persisted.token).await? {
            Some(verified) => {
                if verified.token != persisted.token || verified.identity != persisted.identity {
                    self.persist(&verified).await;
                }
                Ok(Some(verified))
            }
            None => {
                tracing::info!("[Session] persisted token rejected by backend");
                if let Err(err) = self.snapshots.clear().await {
                    tracing::warn!(error = %err, "[Session] could not clear stale session");
                }
                Ok(None)
            }
        }
    }

    /// Profile lookup; any failure degrades to "no profile".
    async fn enrich(&self, identity_id: &str) -> Option<Profile> {
        let query = RowQuery::new(USERS).eq("id", identity_id);
        let row = match self.rows.select_single(&query).await {
            Ok(row) => row,
            Err(err) if err.is_not_found() => {
                tracing::debug!(identity_id, "[Session] no profile row yet");
                return None;
            }
            Err(err) => {
                tracing::warn!(identity_id, error = %err, "[Session] could not fetch profile");
                return None;
            }
        };

        match serde_json::from_value::<Profile>(row) {
            Ok(mut profile) => {
                if profile.id.is_empty() {
                    profile.id = identity_id.to_string();
                }
                Some(profile)
            }
            Err(err) => {
                tracing::warn!(identity_id, error = %err, "[Session] malformed profile row");
                None
            }
        }
    }

    async fn persist(&self, auth: &AuthSession) -> Option<CityPulseError> {
        let snapshot = PersistedSession::from_auth(auth);
        match self.snapshots.save(&snapshot).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "[Session] could not persist session");
                Some(err)
            }
        }
    }

    /// Enrich, persist and publish an authenticated session.
    async fn establish(&self, auth: AuthSession) -> Session {
        let profile = self.enrich(&auth.identity.id).await;
        let persist_error = self.persist(&auth).await;

        tracing::info!(
            identity_id = %auth.identity.id,
            has_profile = profile.is_some(),
            "[Session] authenticated"
        );

        let mut session = Session::authenticated(auth, profile);
        session.warning = persist_error.map(|err| format!("Session not saved: {err}"));
        self.state.replace(session.clone());
        session
    }

    fn begin_auth_attempt(&self) -> Session {
        let prior = self.state.snapshot();
        self.state.update(|s| {
            s.status = SessionStatus::Loading;
            s.last_error = None;
        });
        prior
    }

    /// Restores the pre-attempt session and records the error.
    fn reject_auth_attempt(
        &self,
        prior: Session,
        err: CityPulseError,
        action: &str,
    ) -> CityPulseError {
        tracing::error!(action, error = %err, "[Session] auth attempt failed");
        let status = match prior.status {
            SessionStatus::Uninitialized | SessionStatus::Loading => SessionStatus::Anonymous,
            other => other,
        };
        self.state.replace(Session {
            status,
            last_error: Some(err.clone()),
            ..prior
        });
        err
    }

    fn require_identity(&self) -> Result<String> {
        let identity_id = self.state.read(|s| {
            s.is_authenticated()
                .then(|| s.identity_id().map(str::to_string))
                .flatten()
        });
        identity_id.ok_or_else(|| self.record_error(CityPulseError::Unauthenticated))
    }

    fn record_error(&self, err: CityPulseError) -> CityPulseError {
        self.state.update(|s| s.last_error = Some(err.clone()));
        err
    }

    fn apply_to_profile(&self, identity_id: &str, f: impl FnOnce(&mut Profile)) -> Profile {
        let mut updated = Profile::default();
        self.state.update(|s| {
            let profile = s.profile.get_or_insert_with(|| Profile {
                id: identity_id.to_string(),
                ..Profile::default()
            });
            f(profile);
            s.last_error = None;
            updated = profile.clone();
        });
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::SessionStatus;
    use crate::test_support::{
        FakeAuth, FakeBlobs, FakeRows, MemorySnapshots, auth_session, profile_row,
    };
    use serde_json::json;

    struct Harness {
        store: Arc<SessionStore>,
        auth: Arc<FakeAuth>,
        rows: Arc<FakeRows>,
        blobs: Arc<FakeBlobs>,
        snapshots: Arc<MemorySnapshots>,
    }

    fn harness() -> Harness {
        let auth = Arc::new(FakeAuth::default());
        let rows = Arc::new(FakeRows::default());
        let blobs = Arc::new(FakeBlobs::default());
        let snapshots = Arc::new(MemorySnapshots::default());
        let store = Arc::new(SessionStore::new(
            auth.clone(),
            rows.clone(),
            blobs.clone(),
            snapshots.clone(),
        ));
        Harness {
            store,
            auth,
            rows,
            blobs,
            snapshots,
        }
    }

    async fn signed_in(h: &Harness) -> Session {
        h.auth.accept_credentials("ana@example.com", "pw", auth_session("u-1"));
        h.store.sign_in("ana@example.com", "pw").await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_without_snapshot_is_anonymous() {
        let h = harness();
        let session = h.store.initialize().await.unwrap();
        assert_eq!(session.status, SessionStatus::Anonymous);
        assert_eq!(h.auth.get_session_calls(), 0);
    }

    #[tokio::test]
    async fn test_initialize_restores_and_enriches() {
        let h = harness();
        h.snapshots.preload(PersistedSession::from_auth(&auth_session("u-1")));
        h.auth.set_valid_session(auth_session("u-1"));
        h.rows.push_select(Ok(vec![profile_row("u-1", Some("Cluj-Napoca"))]));

        let session = h.store.initialize().await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.location(), Some("Cluj-Napoca"));
        assert_eq!(h.store.current_location().as_deref(), Some("Cluj-Napoca"));
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_not_fatal() {
        let h = harness();
        h.snapshots.preload(PersistedSession::from_auth(&auth_session("u-1")));
        h.auth.set_valid_session(auth_session("u-1"));
        h.rows
            .push_select(Err(CityPulseError::network("profile lookup timed out")));

        let session = h.store.initialize().await.unwrap();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert!(session.profile.is_none());
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_rejected_snapshot_settles_anonymous_and_is_cleared() {
        let h = harness();
        h.snapshots.preload(PersistedSession::from_auth(&auth_session("u-1")));

        let session = h.store.initialize().await.unwrap();
        assert_eq!(session.status, SessionStatus::Anonymous);
        assert!(h.snapshots.current().is_none());
    }

    #[tokio::test]
    async fn test_refreshed_token_is_persisted() {
        let h = harness();
        h.snapshots.preload(PersistedSession::from_auth(&auth_session("u-1")));
        let mut refreshed = auth_session("u-1");
        refreshed.token.access_token = "rotated".into();
        h.auth.set_valid_session(refreshed);

        h.store.initialize().await.unwrap();
        let stored = h.snapshots.current().unwrap();
        assert_eq!(stored.token.access_token, "rotated");
    }

    #[tokio::test]
    async fn test_initialize_storage_failure_is_error_state() {
        let h = harness();
        h.snapshots.fail_load(CityPulseError::io("disk gone"));

        let err = h.store.initialize().await.unwrap_err();
        assert!(matches!(err, CityPulseError::Io { .. }));
        let session = h.store.snapshot();
        assert_eq!(session.status, SessionStatus::Error);
        assert!(session.identity.is_none() && session.token.is_none());
    }

    #[tokio::test]
    async fn test_initialize_twice_is_idempotent() {
        let h = harness();
        h.snapshots.preload(PersistedSession::from_auth(&auth_session("u-1")));
        h.auth.set_valid_session(auth_session("u-1"));

        let (first, second) = tokio::join!(h.store.initialize(), h.store.initialize());
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first, second);
        assert!(first.is_authenticated());
        assert_eq!(h.auth.get_session_calls(), 1);

        let third = h.store.initialize().await.unwrap();
        assert_eq!(third, first);
        assert_eq!(h.auth.get_session_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_success_persists_snapshot() {
        let h = harness();
        h.store.initialize().await.unwrap();
        let session = signed_in(&h).await;

        assert!(session.is_authenticated());
        assert_eq!(session.identity_id(), Some("u-1"));
        assert_eq!(h.snapshots.current().unwrap().identity.id, "u-1");
        assert_eq!(h.store.snapshot(), session);
    }

    #[tokio::test]
    async fn test_rejected_sign_in_leaves_state_untouched() {
        let h = harness();
        h.store.initialize().await.unwrap();
        let before = h.store.snapshot();

        let err = h.store.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert!(err.is_auth_rejected());

        let after = h.store.snapshot();
        assert_eq!(after.status, SessionStatus::Anonymous);
        assert_eq!(after.identity, before.identity);
        assert_eq!(after.token, before.token);
        assert_eq!(after.last_error, Some(err));
        assert!(h.snapshots.current().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_row_and_signs_in() {
        let h = harness();
        h.store.initialize().await.unwrap();
        h.auth.accept_sign_up("new@example.com", auth_session("u-9"), true);

        let outcome = h
            .store
            .sign_up_with_profile(
                "new@example.com",
                "pw",
                SignUpProfile {
                    first_name: Some("Ion".into()),
                    last_name: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, SignUpOutcome::SignedIn(ref s) if s.is_authenticated()));
        let inserted = h.rows.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].0, USERS);
        assert_eq!(inserted[0].1["id"], json!("u-9"));
        assert_eq!(inserted[0].1["first_name"], json!("Ion"));
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation_stays_anonymous() {
        let h = harness();
        h.store.initialize().await.unwrap();
        h.auth.accept_sign_up("new@example.com", auth_session("u-9"), false);

        let outcome = h.store.sign_up("new@example.com", "pw").await.unwrap();
        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationPending {
                email: "new@example.com".into()
            }
        );
        assert_eq!(h.store.snapshot().status, SessionStatus::Anonymous);
        assert!(h.snapshots.current().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_rejected() {
        let h = harness();
        h.store.initialize().await.unwrap();

        let err = h.store.sign_up("taken@example.com", "pw").await.unwrap_err();
        assert!(err.is_auth_rejected());
        assert!(h.rows.inserted().is_empty());
        assert_eq!(h.store.snapshot().status, SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_remote_fails() {
        let h = harness();
        signed_in(&h).await;
        h.auth.fail_sign_out(CityPulseError::network("offline"));

        let report = h.store.sign_out().await;
        assert!(report.remote_error.as_ref().is_some_and(|e| e.is_network()));

        let session = h.store.snapshot();
        assert_eq!(session.status, SessionStatus::Anonymous);
        assert!(session.identity.is_none() && session.token.is_none() && session.profile.is_none());
        assert!(session.warning.is_some());
        assert!(h.snapshots.current().is_none());
    }

    #[tokio::test]
    async fn test_clean_sign_out() {
        let h = harness();
        signed_in(&h).await;

        let report = h.store.sign_out().await;
        assert!(report.is_clean());
        assert_eq!(h.auth.sign_out_calls(), 1);
        assert!(h.store.snapshot().warning.is_none());
    }

    #[tokio::test]
    async fn test_set_location_requires_authentication() {
        let h = harness();
        h.store.initialize().await.unwrap();

        let err = h.store.set_location("Bucharest").await.unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(h.rows.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_set_location_updates_profile_after_remote_success() {
        let h = harness();
        signed_in(&h).await;
        h.rows.push_update(Ok(vec![profile_row("u-1", Some("Bucharest"))]));

        let profile = h.store.set_location("  Bucharest ").await.unwrap();
        assert_eq!(profile.city.as_deref(), Some("Bucharest"));
        assert_eq!(h.store.current_location().as_deref(), Some("Bucharest"));

        let updates = h.rows.updates();
        assert_eq!(updates[0].1, json!({"city": "Bucharest"}));
        assert_eq!(updates[0].2, vec![Filter::eq("id", "u-1")]);
    }

    #[tokio::test]
    async fn test_set_location_failure_is_not_optimistic() {
        let h = harness();
        signed_in(&h).await;
        h.rows.push_update(Err(CityPulseError::network("offline")));

        let err = h.store.set_location("Iasi").await.unwrap_err();
        assert!(err.is_network());
        let session = h.store.snapshot();
        assert!(session.location().is_none());
        assert!(session.is_authenticated());
        assert_eq!(session.last_error, Some(err));
    }

    #[tokio::test]
    async fn test_set_location_missing_row_is_not_found() {
        let h = harness();
        signed_in(&h).await;
        h.rows.push_update(Ok(vec![]));

        let err = h.store.set_location("Iasi").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(h.store.current_location().is_none());
    }

    #[tokio::test]
    async fn test_upload_profile_picture_links_public_url() {
        let h = harness();
        signed_in(&h).await;
        h.rows.push_update(Ok(vec![profile_row("u-1", None)]));

        let url = h
            .store
            .upload_profile_picture(ProfilePictureUpload::new(vec![1, 2, 3], "png"))
            .await
            .unwrap();

        let uploads = h.blobs.uploads();
        assert_eq!(uploads.len(), 1);
        let (bucket, key, options) = &uploads[0];
        assert_eq!(bucket, AVATAR_BUCKET);
        assert!(key.starts_with("u-1-") && key.ends_with(".png"));
        assert_eq!(options.content_type, "image/png");
        assert!(options.upsert);
        assert_eq!(url, h.blobs.public_url(AVATAR_BUCKET, key));

        let profile = h.store.snapshot().profile.unwrap();
        assert_eq!(profile.profile_picture.as_deref(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_profile_unchanged() {
        let h = harness();
        signed_in(&h).await;
        h.blobs.fail_next(CityPulseError::network("upload reset"));

        let err = h
            .store
            .upload_profile_picture(ProfilePictureUpload::new(vec![1], "jpg"))
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(h.rows.update_calls(), 0);
        assert!(h.store.snapshot().profile.is_none());
    }

    #[tokio::test]
    async fn test_upload_without_profile_row_is_not_found() {
        let h = harness();
        signed_in(&h).await;
        h.rows.push_update(Ok(vec![]));

        let err = h
            .store
            .upload_profile_picture(ProfilePictureUpload::new(vec![1, 2], "png"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(h.store.snapshot().profile.is_none());
        assert_eq!(h.store.snapshot().last_error, Some(err));
    }

    #[tokio::test]
    async fn test_password_reset_request_needs_no_session() {
        let h = harness();
        h.store.initialize().await.unwrap();

        h.store
            .request_password_reset(" ana@example.com ", Some("citypulse://reset-password"))
            .await
            .unwrap();

        assert_eq!(
            h.auth.reset_requests(),
            vec![(
                "ana@example.com".to_string(),
                Some("citypulse://reset-password".to_string())
            )]
        );
        let session = h.store.snapshot();
        assert_eq!(session.status, SessionStatus::Anonymous);
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_password_reset_with_empty_email_makes_no_call() {
        let h = harness();

        let err = h.store.request_password_reset("  ", None).await.unwrap_err();
        assert!(matches!(err, CityPulseError::InvalidInput(_)));
        assert!(h.auth.reset_requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_password_requires_authentication() {
        let h = harness();
        h.store.initialize().await.unwrap();

        let err = h.store.update_password("new-secret").await.unwrap_err();
        assert!(err.is_unauthenticated());
        assert!(h.auth.password_updates().is_empty());
    }

    #[tokio::test]
    async fn test_short_password_is_rejected_locally() {
        let h = harness();
        signed_in(&h).await;

        let err = h.store.update_password("12345").await.unwrap_err();
        assert!(matches!(err, CityPulseError::InvalidInput(_)));
        assert!(h.auth.password_updates().is_empty());
    }

    #[tokio::test]
    async fn test_update_password_uses_session_token() {
        let h = harness();
        signed_in(&h).await;

        h.store.update_password("new-secret").await.unwrap();
        assert_eq!(
            h.auth.password_updates(),
            vec![("access-u-1".to_string(), "new-secret".to_string())]
        );
        assert!(h.store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_password_update_keeps_session() {
        let h = harness();
        signed_in(&h).await;
        h.auth
            .fail_password_update(CityPulseError::auth_rejected("Token has expired"));

        let err = h.store.update_password("new-secret").await.unwrap_err();
        assert!(err.is_auth_rejected());
        let session = h.store.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.last_error, Some(err));
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let h = harness();
        let mut rx = h.store.subscribe();
        h.store.initialize().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, SessionStatus::Anonymous);
    }
}
