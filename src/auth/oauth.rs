//! auth::oauth
//!
//! OAuth web-flow client for GitHub.
//!
//! # Web Flow Overview
//!
//! 1. The relay redirects the browser to the authorize URL with a one-time
//!    `state` value
//! 2. The user approves; GitHub redirects back to the callback with `code`
//!    and the same `state`
//! 3. The relay exchanges `code` (plus the client secret) for an access token
//!
//! The client secret never leaves the relay, and this type's `Debug` output
//! redacts it.
//!
//! # Example
//!
//! ```ignore
//! use repodesk::auth::OAuthClient;
//!
//! let client = OAuthClient::new("Iv1.abc", "secret", "http://localhost:3000/auth/github/callback");
//! let url = client.authorize_url("some-state");
//! // ... browser round trip ...
//! let token = client.exchange_code("code-from-callback").await?;
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::AuthError;
use crate::core::config::{Config, DEFAULT_OAUTH_BASE, DEFAULT_SCOPES};

/// User-Agent header for OAuth requests.
const USER_AGENT_VALUE: &str = "repodesk";

/// Characters escaped in a query component.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Successful token response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Error response from the token endpoint.
///
/// GitHub reports exchange failures with HTTP 200 and this body.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Form body for the token endpoint.
#[derive(Serialize)]
struct ExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Client for the GitHub OAuth web flow.
#[derive(Clone)]
pub struct OAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    scopes: Vec<String>,
    /// Base URL of the OAuth endpoints (e.g., "https://github.com")
    oauth_base: String,
}

// Custom Debug to avoid exposing the client secret
impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .field("oauth_base", &self.oauth_base)
            .finish()
    }
}

impl OAuthClient {
    /// Create a client against github.com with the default scopes.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
        }
    }

    /// Build a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotConfigured`] if the client id or secret is unset.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let client_id = config
            .oauth_client_id()
            .ok_or(AuthError::NotConfigured("oauth.client_id"))?;
        let client_secret = config
            .oauth_client_secret()
            .ok_or(AuthError::NotConfigured("oauth.client_secret"))?;
        Ok(Self::new(client_id, client_secret, config.oauth_callback_url())
            .with_scopes(config.oauth_scopes())
            .with_oauth_base(config.oauth_base()))
    }

    /// Override the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Point at a different OAuth host (GitHub Enterprise or a test server).
    pub fn with_oauth_base(mut self, base: impl Into<String>) -> Self {
        let base: String = base.into();
        self.oauth_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    fn token_url(&self) -> String {
        format!("{}/login/oauth/access_token", self.oauth_base)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers
    }

    /// URL the browser is sent to in order to approve access.
    pub fn authorize_url(&self, state: &str) -> String {
        let scope = self.scopes.join(" ");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.callback_url.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_COMPONENT)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/login/oauth/authorize?{}", self.oauth_base, query)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ExchangeFailed`] if the endpoint rejects the code
    /// - [`AuthError::OAuthApi`] on a non-success status
    /// - [`AuthError::Network`] if the request could not be sent
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let request = ExchangeRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            code,
            redirect_uri: &self.callback_url,
        };

        let response = self
            .client
            .post(self.token_url())
            .headers(self.headers())
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::OAuthApi {
                status: status.as_u16(),
                message: body,
            });
        }

        if let Ok(tokens) = serde_json::from_str::<TokenResponse>(&body) {
            debug!(scope = tokens.scope.as_deref().unwrap_or(""), "code exchanged");
            return Ok(tokens.access_token);
        }

        match serde_json::from_str::<OAuthErrorBody>(&body) {
            Ok(err) => Err(AuthError::ExchangeFailed(format!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            ))),
            Err(_) => Err(AuthError::ExchangeFailed("unexpected response".into())),
        }
    }
}
