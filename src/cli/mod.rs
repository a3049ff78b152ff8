//! cli
//!
//! Command-line interface for repodesk.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers build a [`crate::relay::ContentRelay`]
//! (direct to the host, or through `--relay`) and drive a
//! [`crate::workspace::Workspace`] over it, the same core the browser
//! client's state is modeled on.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::warn;

use crate::core::config::Config;
use crate::logging::{self, Verbosity};

/// Environment variable holding the relay session id for `--relay`.
pub const SESSION_ENV_VAR: &str = "REPODESK_SESSION";

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub relay_url: Option<String>,
    pub quiet: bool,
    pub interactive: bool,
}

impl Context {
    /// Load configuration from `--config` or the default locations.
    ///
    /// Load warnings are logged, not returned.
    pub fn config(&self) -> Result<Config> {
        match &self.config_path {
            Some(path) => {
                let mut config = Config::from_path(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                config
                    .apply_env(|key| std::env::var(key).ok())
                    .context("Invalid environment override")?;
                Ok(config)
            }
            None => {
                let result = Config::load().context("Failed to load configuration")?;
                for warning in &result.warnings {
                    warn!(path = %warning.path.display(), "{}", warning.message);
                }
                Ok(result.config)
            }
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(Verbosity::from_flags(cli.debug, cli.quiet));

    let ctx = Context {
        interactive: cli.interactive(),
        config_path: cli.config,
        relay_url: cli.relay,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
