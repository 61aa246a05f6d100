use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::events::SessionEvent;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Token storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Raised when an operation needs an identity and none is loaded
    #[error("Not logged in - run `sami login` first")]
    NotAuthenticated,
}

/// Owner of the token lifecycle and the in-memory identity.
///
/// The token lives in the client's `TokenStorage`; the `User` is fetched
/// from the backend and kept in memory only, in a slot the client shares so
/// a 401 on any request logs the store out too. `is_authenticated` follows
/// the user, not the token, so a token whose identity can't be fetched
/// never counts as logged in.
pub struct SessionStore {
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.api.session_events().subscribe()
    }

    pub async fn user(&self) -> Option<User> {
        self.api.identity().read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.identity().read().await.is_some()
    }

    /// The current user, or `SessionError::NotAuthenticated`.
    pub async fn require_user(&self) -> Result<User, SessionError> {
        self.user().await.ok_or(SessionError::NotAuthenticated)
    }

    /// Pick up a session left by a previous run.
    ///
    /// Never fails: a token that can't be read or whose identity lookup
    /// fails is discarded and the store stays logged out. Returns whether
    /// a user is now loaded.
    pub async fn restore(&self) -> bool {
        match self.api.storage().load() {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No stored token, starting logged out");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, discarding it");
                self.clear().await;
                return false;
            }
        }

        match self.api.current_user().await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                *self.api.identity().write().await = Some(user);
                true
            }
            Err(e) => {
                warn!(error = %e, "Stored token failed identity lookup, discarding it");
                self.clear().await;
                false
            }
        }
    }

    /// Exchange credentials for a token and load the identity.
    ///
    /// If the credential exchange fails nothing is written. If it succeeds
    /// but the identity lookup fails, the new token is removed again before
    /// the error is returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let token = match self.api.login(email, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        self.api
            .storage()
            .store(&token.access_token)
            .map_err(SessionError::Storage)?;

        match self.api.current_user().await {
            Ok(user) => {
                info!(user_id = user.id, "Login successful");
                *self.api.identity().write().await = Some(user.clone());
                self.api.session_events().emit(SessionEvent::LoggedIn(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Identity lookup after login failed");
                self.clear().await;
                Err(e.into())
            }
        }
    }

    /// End the session. Safe to call when already logged out.
    ///
    /// The backend is told first (best effort, bounded by `LOGOUT_TIMEOUT`)
    /// while the token is still attached. If it answers 401 the client has
    /// already emitted `Expired`, so `LoggedOut` is skipped to keep one
    /// navigation per call.
    pub async fn logout(&self) {
        let has_token = matches!(self.api.storage().load(), Ok(Some(_)));

        let mut expired = false;
        if has_token {
            match self.api.logout().await {
                Ok(_) => debug!("Backend acknowledged logout"),
                Err(ApiError::Unauthorized) => expired = true,
                Err(e) => debug!(error = %e, "Backend logout failed, clearing local session anyway"),
            }
        }

        self.clear().await;

        if !expired {
            self.api.session_events().emit(SessionEvent::LoggedOut);
        }
        info!("Logged out");
    }

    /// Swap the stored token for a fresh one from `/auth/refresh`.
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        if !self.is_authenticated().await {
            return Err(SessionError::NotAuthenticated);
        }
        let token = self.api.refresh_token().await?;
        self.api
            .storage()
            .store(&token.access_token)
            .map_err(SessionError::Storage)?;
        debug!("Token refreshed");
        Ok(())
    }

    async fn clear(&self) {
        if let Err(e) = self.api.storage().delete() {
            warn!(error = %e, "Failed to delete stored token");
        }
        *self.api.identity().write().await = None;
    }
}
