//! auth::provider
//!
//! Host token lookup for the command-line client.
//!
//! # Resolution Order
//!
//! 1. `GITHUB_TOKEN` in the environment
//! 2. The `github.token` entry in the secret store (written by
//!    `repodesk auth`)
//!
//! The environment always wins.
//!
//! # Example
//!
//! ```
//! use repodesk::auth::{StoredTokenProvider, TokenProvider};
//! use repodesk::secrets::MemorySecretStore;
//!
//! let provider = StoredTokenProvider::new(Box::new(MemorySecretStore::new()))
//!     .with_env_token(None);
//! provider.store_token("gho_example").unwrap();
//! assert!(provider.is_authenticated());
//! ```

use super::errors::AuthError;
use super::TokenProvider;
use crate::secrets::SecretStore;

/// Environment variable consulted before the secret store.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Secret store key for the host token.
pub const TOKEN_SECRET_KEY: &str = "github.token";

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    SecretStore,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Environment => write!(f, "${}", TOKEN_ENV_VAR),
            TokenSource::SecretStore => write!(f, "secret store"),
        }
    }
}

/// Token provider over the environment and a [`SecretStore`].
pub struct StoredTokenProvider {
    store: Box<dyn SecretStore>,
    env_token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for StoredTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokenProvider")
            .field("has_env_token", &self.env_token.is_some())
            .finish()
    }
}

impl StoredTokenProvider {
    /// Provider reading `GITHUB_TOKEN` from the process environment.
    pub fn new(store: Box<dyn SecretStore>) -> Self {
        let env_token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self { store, env_token }
    }

    /// Replace the environment token (tests, or callers with their own env).
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        self.env_token = token;
        self
    }

    /// The token and where it came from, if any.
    pub fn resolve(&self) -> Result<Option<(String, TokenSource)>, AuthError> {
        if let Some(token) = &self.env_token {
            return Ok(Some((token.clone(), TokenSource::Environment)));
        }
        Ok(self
            .store
            .get(TOKEN_SECRET_KEY)?
            .map(|t| (t, TokenSource::SecretStore)))
    }

    /// Persist a token to the secret store.
    pub fn store_token(&self, token: &str) -> Result<(), AuthError> {
        self.store.set(TOKEN_SECRET_KEY, token.trim())?;
        Ok(())
    }

    /// Remove the stored token. The environment token, if any, is untouched.
    pub fn clear_token(&self) -> Result<(), AuthError> {
        self.store.delete(TOKEN_SECRET_KEY)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenProvider for StoredTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        self.resolve()?
            .map(|(token, _)| token)
            .ok_or(AuthError::Unauthenticated)
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.resolve(), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    fn provider(env: Option<&str>) -> StoredTokenProvider {
        StoredTokenProvider::new(Box::new(MemorySecretStore::new()))
            .with_env_token(env.map(str::to_string))
    }

    #[tokio::test]
    async fn no_token_is_unauthenticated() {
        let p = provider(None);
        assert!(!p.is_authenticated());
        assert!(matches!(
            p.bearer_token().await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn stored_token_is_used() {
        let p = provider(None);
        p.store_token("  gho_stored\n").unwrap();
        assert_eq!(p.bearer_token().await.unwrap(), "gho_stored");
        assert_eq!(p.resolve().unwrap().unwrap().1, TokenSource::SecretStore);
    }

    #[tokio::test]
    async fn environment_wins() {
        let p = provider(Some("gho_env"));
        p.store_token("gho_stored").unwrap();
        assert_eq!(p.bearer_token().await.unwrap(), "gho_env");
        assert_eq!(p.resolve().unwrap().unwrap().1, TokenSource::Environment);
    }

    #[test]
    fn clear_removes_stored_token() {
        let p = provider(None);
        p.store_token("gho_stored").unwrap();
        p.clear_token().unwrap();
        assert!(!p.is_authenticated());
    }

    #[test]
    fn debug_hides_token() {
        let p = provider(Some("gho_env_secret"));
        assert!(!format!("{:?}", p).contains("gho_env_secret"));
    }
}
