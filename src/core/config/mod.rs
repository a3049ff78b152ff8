//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$REPODESK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repodesk/config.toml`
//! 3. `~/.repodesk/config.toml`
//!
//! # Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `PORT` | `relay.port` |
//! | `REPODESK_ENV=production` | `relay.production` |
//! | `CLIENT_URL` | `relay.client_url` |
//! | `GITHUB_API_URL` | `relay.api_base` |
//! | `GITHUB_CLIENT_ID` | `oauth.client_id` |
//! | `GITHUB_SECRET_KEY` | `oauth.client_secret` |
//! | `GITHUB_CALLBACK_URL` | `oauth.callback_url` |
//!
//! # Example
//!
//! ```no_run
//! use repodesk::core::config::Config;
//!
//! let result = Config::load().unwrap();
//! let config = result.config;
//! println!("Relay port: {}", config.port());
//! println!("Client: {}", config.client_url());
//! ```

pub mod schema;

pub use schema::{ConfigFile, EditorConfig, OAuthConfig, RelayConfig, SecretsConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::workspace::DiscardPolicy;

/// Default relay listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Browser origin used outside production.
pub const DEV_CLIENT_URL: &str = "http://localhost:5173";

/// Browser origin used in production.
pub const PROD_CLIENT_URL: &str = "https://gitsignup.netlify.app";

/// Default host REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default host web base (OAuth endpoints).
pub const DEFAULT_OAUTH_BASE: &str = "https://github.com";

/// Default commit message template.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update {name}";

/// Default OAuth scopes.
pub const DEFAULT_SCOPES: &[&str] = &["repo", "user:email"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply defaults, so callers never see an unset value
/// except where "unset" is meaningful (OAuth credentials).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File configuration with environment overrides applied
    pub file: ConfigFile,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// a value (from either source) is invalid. A missing config file is not
    /// an error.
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let (file, path) = Self::load_file(&mut warnings)?;
        let mut config = Config { file, path };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.file.validate()?;
        Ok(ConfigLoadResult { config, warnings })
    }

    /// Build a configuration from an explicit file, without touching the
    /// environment.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = Self::read_config(path)?;
        file.validate()?;
        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn load_file(
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
        // 1. Check $REPODESK_CONFIG
        if let Ok(path) = std::env::var("REPODESK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: "REPODESK_CONFIG points to a missing file; falling back".to_string(),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/repodesk/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repodesk/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.repodesk/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".repodesk/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((ConfigFile::default(), None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Layer environment overrides on top of the file configuration.
    ///
    /// `lookup` abstracts the environment so tests don't mutate process state.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let relay = self.file.relay.get_or_insert_with(RelayConfig::default);

        if let Some(port) = lookup("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue(format!("PORT '{}' is not a port", port)))?;
            relay.port = Some(port);
        }
        if let Some(env) = lookup("REPODESK_ENV") {
            relay.production = Some(env.eq_ignore_ascii_case("production"));
        }
        if let Some(url) = lookup("CLIENT_URL") {
            relay.client_url = Some(url);
        }
        if let Some(url) = lookup("GITHUB_API_URL") {
            relay.api_base = Some(url);
        }

        let oauth = self.file.oauth.get_or_insert_with(OAuthConfig::default);
        if let Some(id) = lookup("GITHUB_CLIENT_ID") {
            oauth.client_id = Some(id);
        }
        if let Some(secret) = lookup("GITHUB_SECRET_KEY") {
            oauth.client_secret = Some(secret);
        }
        if let Some(url) = lookup("GITHUB_CALLBACK_URL") {
            oauth.callback_url = Some(url);
        }

        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    fn relay(&self) -> Option<&RelayConfig> {
        self.file.relay.as_ref()
    }

    fn oauth(&self) -> Option<&OAuthConfig> {
        self.file.oauth.as_ref()
    }

    fn editor(&self) -> Option<&EditorConfig> {
        self.file.editor.as_ref()
    }

    /// Relay listen port. Defaults to 3000.
    pub fn port(&self) -> u16 {
        self.relay().and_then(|r| r.port).unwrap_or(DEFAULT_PORT)
    }

    /// Whether the relay runs in production mode. Defaults to `false`.
    pub fn production(&self) -> bool {
        self.relay().and_then(|r| r.production).unwrap_or(false)
    }

    /// Browser origin for CORS and redirects.
    ///
    /// Defaults depend on [`production`](Self::production).
    pub fn client_url(&self) -> String {
        match self.relay().and_then(|r| r.client_url.as_deref()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.production() => PROD_CLIENT_URL.to_string(),
            None => DEV_CLIENT_URL.to_string(),
        }
    }

    /// Host REST API base URL.
    pub fn api_base(&self) -> &str {
        self.relay()
            .and_then(|r| r.api_base.as_deref())
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Host web base URL used for OAuth endpoints.
    pub fn oauth_base(&self) -> &str {
        self.relay()
            .and_then(|r| r.oauth_base.as_deref())
            .unwrap_or(DEFAULT_OAUTH_BASE)
    }

    /// Maximum repository pages per listing. Defaults to 1.
    pub fn repo_pages(&self) -> u32 {
        self.relay().and_then(|r| r.repo_pages).unwrap_or(1)
    }

    /// OAuth client id, if configured.
    pub fn oauth_client_id(&self) -> Option<&str> {
        self.oauth().and_then(|o| o.client_id.as_deref())
    }

    /// OAuth client secret, if configured.
    pub fn oauth_client_secret(&self) -> Option<&str> {
        self.oauth().and_then(|o| o.client_secret.as_deref())
    }

    /// OAuth redirect URI.
    ///
    /// Defaults to the relay's own callback route on localhost.
    pub fn oauth_callback_url(&self) -> String {
        match self.oauth().and_then(|o| o.callback_url.as_deref()) {
            Some(url) => url.to_string(),
            None => format!("http://localhost:{}/auth/github/callback", self.port()),
        }
    }

    /// Requested OAuth scopes.
    pub fn oauth_scopes(&self) -> Vec<String> {
        match self.oauth().and_then(|o| o.scopes.as_ref()) {
            Some(scopes) => scopes.clone(),
            None => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Policy for replacing a dirty edit session. Defaults to discard.
    pub fn discard_policy(&self) -> DiscardPolicy {
        self.editor()
            .and_then(|e| e.discard_policy)
            .unwrap_or_default()
    }

    /// Commit message template.
    pub fn commit_message_template(&self) -> &str {
        self.editor()
            .and_then(|e| e.commit_message.as_deref())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    /// Get the secrets provider. Defaults to "file".
    pub fn secrets_provider(&self) -> &str {
        self.file
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("file")
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
