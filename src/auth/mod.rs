//! auth - identity and tokens
//!
//! Two consumers need credentials:
//!
//! - the relay server, which runs the GitHub OAuth web flow and keeps
//!   each browser's token in a server-side session
//! - the command-line client, which uses a token from the environment or
//!   the secret store
//!
//! # Components
//!
//! - [`OAuthClient`] - authorize URL and code exchange
//! - [`SessionStore`] - login states and sessions, in memory
//! - [`IdentityProvider`] - login, current user, logout
//! - [`User`] / [`UserProfile`] - the signed-in user with and without token
//! - [`TokenProvider`] / [`StoredTokenProvider`] - bearer tokens for the CLI
//!
//! # Security
//!
//! Tokens never appear in logs, error messages, JSON sent to clients, or
//! `Debug` output. Every type here holding one redacts it.

mod errors;
mod identity;
mod oauth;
mod provider;
mod session;
mod user;

pub use errors::AuthError;
pub use identity::{IdentityProvider, LoginRedirect};
pub use oauth::OAuthClient;
pub use provider::{StoredTokenProvider, TokenSource, TOKEN_ENV_VAR, TOKEN_SECRET_KEY};
pub use session::{SessionId, SessionStore, SESSION_TTL, STATE_TTL};
pub use user::{User, UserProfile};

/// Source of a bearer token for host calls.
///
/// # Example
///
/// ```ignore
/// use repodesk::auth::TokenProvider;
/// use repodesk::host::github::GitHubHost;
///
/// async fn host_for(provider: &dyn TokenProvider) -> Result<GitHubHost, repodesk::auth::AuthError> {
///     Ok(GitHubHost::new(provider.bearer_token().await?))
/// }
/// ```
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// A usable bearer token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if no token is available
    /// - [`AuthError::SecretStore`] if the store cannot be read
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Whether a token is available, without side effects.
    fn is_authenticated(&self) -> bool;
}
