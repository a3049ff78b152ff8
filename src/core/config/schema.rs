//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Config File
//!
//! Located at (in order of precedence):
//! 1. `$REPODESK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repodesk/config.toml`
//! 3. `~/.repodesk/config.toml` (canonical location)
//!
//! # Validation
//!
//! Config values are validated after parsing (and again after environment
//! overrides are applied) so that a bad URL or an unknown policy is caught
//! before the relay starts listening.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::workspace::DiscardPolicy;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// [relay]
/// port = 3000
/// client_url = "http://localhost:5173"
/// production = false
/// repo_pages = 1
///
/// [oauth]
/// client_id = "Iv1.0123456789abcdef"
/// callback_url = "http://localhost:3000/auth/github/callback"
/// scopes = ["repo", "user:email"]
///
/// [editor]
/// discard_policy = "protect"
/// commit_message = "Update {name}"
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Relay server settings
    pub relay: Option<RelayConfig>,

    /// OAuth application settings
    pub oauth: Option<OAuthConfig>,

    /// Edit buffer behavior
    pub editor: Option<EditorConfig>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(relay) = &self.relay {
            relay.validate()?;
        }
        if let Some(oauth) = &self.oauth {
            oauth.validate()?;
        }
        if let Some(editor) = &self.editor {
            editor.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        Ok(())
    }
}

/// Relay server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Listen port (default: 3000)
    pub port: Option<u16>,

    /// Browser origin allowed by CORS and used for post-login redirects
    pub client_url: Option<String>,

    /// Production mode: secure cookies, cross-site `SameSite=None`
    pub production: Option<bool>,

    /// Host REST API base URL
    pub api_base: Option<String>,

    /// Host web base URL for OAuth endpoints
    pub oauth_base: Option<String>,

    /// Maximum pages of repositories fetched per listing
    pub repo_pages: Option<u32>,
}

impl RelayConfig {
    /// Validate the relay settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("relay.client_url", &self.client_url),
            ("relay.api_base", &self.api_base),
            ("relay.oauth_base", &self.oauth_base),
        ] {
            if let Some(url) = value {
                validate_http_url(key, url)?;
            }
        }

        if self.repo_pages == Some(0) {
            return Err(ConfigError::InvalidValue(
                "relay.repo_pages must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// OAuth application settings.
///
/// The client secret may live here, but `GITHUB_SECRET_KEY` in the
/// environment overrides it and is the recommended place.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    /// OAuth application client id
    pub client_id: Option<String>,

    /// OAuth application client secret
    pub client_secret: Option<String>,

    /// Redirect URI registered with the host
    pub callback_url: Option<String>,

    /// Requested scopes
    pub scopes: Option<Vec<String>>,
}

// Custom Debug to avoid exposing client_secret
impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl OAuthConfig {
    /// Validate the OAuth settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.callback_url {
            validate_http_url("oauth.callback_url", url)?;
        }
        if let Some(scopes) = &self.scopes {
            if scopes.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "oauth.scopes cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Edit buffer behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// What to do with a dirty buffer when another file is opened
    pub discard_policy: Option<DiscardPolicy>,

    /// Commit message template; `{name}` and `{path}` are substituted
    pub commit_message: Option<String>,
}

impl EditorConfig {
    /// Validate the editor settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(template) = &self.commit_message {
            if template.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "editor.commit_message cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use ("file")
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be an http(s) URL, got '{}'",
            key, url
        )))
    }
}
