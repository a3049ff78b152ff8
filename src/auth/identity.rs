//! auth::identity
//!
//! The relay's identity provider: OAuth login, session lookup, logout.
//!
//! # Flow
//!
//! 1. [`IdentityProvider::begin_login`] issues a one-time `state` and the
//!    authorize URL to redirect to
//! 2. [`IdentityProvider::complete_login`] checks the `state`, exchanges the
//!    code, resolves the account through [`Host::authenticated_user`], and
//!    opens a session
//! 3. [`IdentityProvider::current_user`] maps a session id back to the user
//!    (and their token) on every authenticated request
//!
//! [`Host::authenticated_user`]: crate::host::Host::authenticated_user

use std::sync::Arc;

use tracing::{info, warn};

use super::errors::AuthError;
use super::oauth::OAuthClient;
use super::session::{SessionId, SessionStore};
use super::user::User;
use crate::host::HostConnector;

/// Where to send the browser to start a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub url: String,
    pub state: String,
}

/// OAuth login plus server-side sessions.
pub struct IdentityProvider {
    oauth: OAuthClient,
    sessions: SessionStore,
    connector: Arc<dyn HostConnector>,
}

impl std::fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("oauth", &self.oauth)
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl IdentityProvider {
    pub fn new(oauth: OAuthClient, connector: Arc<dyn HostConnector>) -> Self {
        Self::with_sessions(oauth, connector, SessionStore::new())
    }

    pub fn with_sessions(
        oauth: OAuthClient,
        connector: Arc<dyn HostConnector>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            oauth,
            sessions,
            connector,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a login: issue a `state` and build the authorize URL.
    pub fn begin_login(&self) -> LoginRedirect {
        let state = self.sessions.issue_state();
        LoginRedirect {
            url: self.oauth.authorize_url(&state),
            state,
        }
    }

    /// Finish a login from the callback's `code` and `state`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidState`] if `state` is unknown, expired, or reused
    /// - [`AuthError::ExchangeFailed`] / [`AuthError::OAuthApi`] if the code is rejected
    /// - [`AuthError::Profile`] if the account lookup fails
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<SessionId, AuthError> {
        if !self.sessions.take_state(state) {
            warn!("login callback with unknown or expired state");
            return Err(AuthError::InvalidState);
        }

        let token = self.oauth.exchange_code(code).await?;
        let host = self.connector.connect(&token);
        let account = host
            .authenticated_user()
            .await
            .map_err(|e| AuthError::Profile(e.to_string()))?;

        info!(user = %account.login, "login completed");
        let user = User::from_host(account, token);
        Ok(self.sessions.create(user))
    }

    /// The user behind a session id.
    pub fn current_user(&self, sid: &SessionId) -> Result<User, AuthError> {
        self.sessions.get(sid).ok_or(AuthError::Unauthenticated)
    }

    /// End a session. Returns whether one existed.
    pub fn logout(&self, sid: &SessionId) -> bool {
        self.sessions.remove(sid)
    }
}
