//! cli::commands::serve
//!
//! Run the relay server in the foreground.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::runtime;
use crate::auth::AuthError;
use crate::cli::Context;
use crate::server::{self, AppState};

/// Run the relay until interrupted.
pub fn serve(ctx: &Context, port: Option<u16>) -> Result<()> {
    let config = ctx.config()?;
    let port = port.unwrap_or_else(|| config.port());

    let state = AppState::from_config(&config).map_err(|e| match e {
        AuthError::NotConfigured(key) => anyhow::anyhow!(
            "Missing {}. Set it in the config file or via GITHUB_CLIENT_ID / GITHUB_SECRET_KEY.",
            key
        ),
        other => anyhow::Error::new(other),
    })?;

    if !ctx.quiet {
        println!("Relay listening on port {} for {}", port, state.client_url());
    }

    runtime()?
        .block_on(server::serve(Arc::new(state), port))
        .with_context(|| format!("Relay server on port {} failed", port))
}
