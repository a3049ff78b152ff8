//! cli::commands::auth
//!
//! Store, inspect, or remove the command-line client's GitHub token.
//!
//! # Design
//!
//! - Tokens go to the configured [`SecretStore`](crate::secrets::SecretStore)
//! - Tokens are NEVER printed, in whole or in part
//! - `--status` reports where the active token comes from
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! repodesk auth
//!
//! # Non-interactive
//! repodesk auth --token ghp_xxxx
//!
//! # Check status
//! repodesk auth --status
//!
//! # Remove stored token
//! repodesk auth --logout
//! ```

use std::io::{self, Write};

use anyhow::{bail, Context as _, Result};

use crate::auth::{StoredTokenProvider, TOKEN_ENV_VAR};
use crate::cli::Context;
use crate::secrets;

/// Run the auth command.
///
/// # Arguments
///
/// * `ctx` - CLI context with the interactive flag
/// * `token` - Optional token provided via --token
/// * `status` - If true, show authentication status instead of storing
/// * `logout` - If true, remove stored authentication
pub fn auth(ctx: &Context, token: Option<&str>, status: bool, logout: bool) -> Result<()> {
    let config = ctx.config()?;
    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;
    let provider = StoredTokenProvider::new(store);

    if status {
        return show_status(&provider, ctx.quiet);
    }

    if logout {
        return do_logout(&provider, ctx.quiet);
    }

    let token_value = get_token(ctx, token)?;
    validate_token(&token_value)?;

    provider
        .store_token(&token_value)
        .context("Failed to store token")?;

    if !ctx.quiet {
        println!("Token stored.");
        if std::env::var_os(TOKEN_ENV_VAR).is_some() {
            println!("Note: ${} is set and takes precedence.", TOKEN_ENV_VAR);
        }
    }

    Ok(())
}

/// Show authentication status.
fn show_status(provider: &StoredTokenProvider, quiet: bool) -> Result<()> {
    let source = provider
        .resolve()
        .context("Failed to read token")?
        .map(|(_, source)| source);

    match (source, quiet) {
        (Some(_), true) => println!("authenticated"),
        (None, true) => println!("not_authenticated"),
        (Some(source), false) => println!("Authenticated via {}.", source),
        (None, false) => {
            println!("Not authenticated.");
            println!("Run 'repodesk auth' or set {}.", TOKEN_ENV_VAR);
        }
    }

    Ok(())
}

/// Remove stored authentication.
fn do_logout(provider: &StoredTokenProvider, quiet: bool) -> Result<()> {
    provider
        .clear_token()
        .context("Failed to remove stored token")?;

    if !quiet {
        println!("Stored token removed.");
    }

    Ok(())
}

/// Get token from argument or interactive prompt.
fn get_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.trim().to_string());
    }

    if !ctx.interactive {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("GitHub token: ");
    io::stdout().flush()?;

    let token = rpassword::read_password().context("Failed to read token")?;
    Ok(token.trim().to_string())
}

/// Basic shape checks; the token is not checked against the API.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }

    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }

    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }

    Ok(())
}
