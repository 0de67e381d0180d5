//! Auth surface of the remote backend.

use async_trait::async_trait;

use super::model::{AuthResponse, AuthSession, AuthToken};
use crate::error::Result;

/// Remote authentication provider.
///
/// Implementations return `AuthRejected` for refused credentials and
/// `NetworkFailure` for transport problems.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse>;

    /// Invalidates the token remotely.
    async fn sign_out(&self, token: &AuthToken) -> Result<()>;

    /// Verifies a stored token, refreshing it when the provider allows.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))`: token is valid (possibly refreshed)
    /// - `Ok(None)`: token is no longer valid
    /// - `Err(_)`: validity could not be determined
    async fn get_session(&self, token: &AuthToken) -> Result<Option<AuthSession>>;

    /// Sends a recovery email. The link in it leads to `redirect_to` with a
    /// recovery session.
    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<()>;

    /// Replaces the password of the account that owns `token`.
    async fn update_password(&self, token: &AuthToken, new_password: &str) -> Result<()>;
}
