//! auth::errors
//!
//! Authentication error types for the OAuth web flow.
//!
//! # Design
//!
//! Error messages never contain tokens, client secrets, or session ids.
//! Variants carry enough context to log and act on without exposing
//! credentials.
//!
//! # Example
//!
//! ```
//! use repodesk::auth::AuthError;
//!
//! let err = AuthError::Unauthenticated;
//! assert!(err.needs_login());
//! assert_eq!(err.to_string(), "not authenticated");
//! ```

use thiserror::Error;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No valid session (or stored token) exists.
    #[error("not authenticated")]
    Unauthenticated,

    /// The OAuth `state` was unknown, expired, or already used.
    #[error("invalid or expired login state")]
    InvalidState,

    /// A required OAuth setting is missing.
    #[error("OAuth is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// The authorization code could not be exchanged for a token.
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The OAuth endpoint returned an unexpected status.
    #[error("OAuth API error: {status} - {message}")]
    OAuthApi {
        /// HTTP status code
        status: u16,
        /// Error message from the endpoint
        message: String,
    },

    /// Looking up the account behind a fresh token failed.
    #[error("failed to fetch user profile: {0}")]
    Profile(String),

    /// Error from secret storage.
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// Network error during authentication.
    #[error("network error: {0}")]
    Network(String),
}

impl AuthError {
    /// Whether the fix is to (re)start the login flow.
    pub fn needs_login(&self) -> bool {
        matches!(self, AuthError::Unauthenticated | AuthError::InvalidState)
    }

    /// Whether a retry might succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

impl From<crate::secrets::SecretError> for AuthError {
    fn from(err: crate::secrets::SecretError) -> Self {
        AuthError::SecretStore(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        // Query parameters never reach the message.
        AuthError::Network(err.without_url().to_string())
    }
}
