//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Builds a relay and, for tree and file commands, a workspace
//! 3. Formats and displays output on stdout
//!
//! # Async Commands
//!
//! Everything except `auth` and `completion` does network I/O. Those
//! handlers are async internally; their sync entry points run them on a
//! fresh `tokio::runtime::Runtime`.

mod auth;
mod cat;
mod completion;
mod new;
mod put;
mod repos;
mod serve;
mod tree;

pub use auth::auth;
pub use cat::cat;
pub use completion::completion;
pub use new::new_file;
pub use put::put;
pub use repos::repos;
pub use serve::serve;
pub use tree::tree;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use tracing::debug;

use super::{Context, SESSION_ENV_VAR};
use crate::auth::{AuthError, StoredTokenProvider, TokenProvider};
use crate::cli::args::Command;
use crate::core::config::Config;
use crate::core::types::RepoRef;
use crate::host::github::GitHubHost;
use crate::relay::{ContentRelay, HostRelay, RelayClient};
use crate::secrets;
use crate::workspace::WorkspaceError;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Serve { port } => serve(ctx, port),
        Command::Auth {
            token,
            status,
            logout,
        } => auth(ctx, token.as_deref(), status, logout),
        Command::Repos => repos(ctx),
        Command::Tree { repo, expand } => tree(ctx, &repo, &expand),
        Command::Cat { repo, path } => cat(ctx, &repo, &path),
        Command::Put {
            repo,
            path,
            from,
            message,
        } => put(ctx, &repo, &path, &from, message.as_deref()),
        Command::New {
            repo,
            path,
            from,
            message,
        } => new_file(ctx, &repo, &path, &from, message.as_deref()),
        Command::Completion { shell } => completion(shell),
    }
}

/// The relay every content command goes through.
///
/// With `--relay`, calls go to a running relay using the session id in
/// `$REPODESK_SESSION`. Otherwise they go straight to the host API with the
/// token from `$GITHUB_TOKEN` or the secret store.
pub(crate) async fn open_relay(ctx: &Context, config: &Config) -> Result<Arc<dyn ContentRelay>> {
    if let Some(url) = &ctx.relay_url {
        let mut client = RelayClient::new(url.as_str());
        if let Ok(sid) = std::env::var(SESSION_ENV_VAR) {
            client = client.with_session(sid);
        }
        debug!(relay = %client.base_url(), "using relay");
        return Ok(Arc::new(client));
    }

    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;
    let provider = StoredTokenProvider::new(store);
    let token = provider.bearer_token().await.map_err(|e| match e {
        AuthError::Unauthenticated => {
            anyhow!("Not authenticated. Run 'repodesk auth' or set GITHUB_TOKEN.")
        }
        other => anyhow::Error::new(other).context("Failed to read token"),
    })?;

    let host = GitHubHost::with_api_base(token, config.api_base());
    Ok(Arc::new(
        HostRelay::new(Arc::new(host)).with_repo_pages(config.repo_pages()),
    ))
}

pub(crate) fn parse_repo(repo: &str) -> Result<RepoRef> {
    RepoRef::parse(repo).with_context(|| format!("Invalid repository '{}'", repo))
}

/// Text from a local file, or stdin for `-`.
pub(crate) fn read_input(from: &Path) -> Result<String> {
    if from == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(from).with_context(|| format!("Failed to read {}", from.display()))
}

/// A user-facing error for a workspace failure.
pub(crate) fn explain(err: WorkspaceError) -> anyhow::Error {
    match err {
        WorkspaceError::Unauthenticated => {
            anyhow!("Not authenticated. Run 'repodesk auth' or set GITHUB_TOKEN.")
        }
        WorkspaceError::StaleVersion(_) => {
            anyhow!("The file changed upstream since it was loaded. Run the command again.")
        }
        other => anyhow::Error::new(other),
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repo_reports_input() {
        let err = parse_repo("not-a-repo").unwrap_err();
        assert!(err.to_string().contains("not-a-repo"));
        assert_eq!(parse_repo("octo/demo").unwrap().name(), "demo");
    }

    #[test]
    fn read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "hello\n").unwrap();
        assert_eq!(read_input(&path).unwrap(), "hello\n");
        assert!(read_input(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn explain_stale_version() {
        let msg = explain(WorkspaceError::StaleVersion("sha".into())).to_string();
        assert!(msg.contains("changed upstream"));
        let msg = explain(WorkspaceError::Unauthenticated).to_string();
        assert!(msg.contains("repodesk auth"));
    }

    #[tokio::test]
    async fn relay_flag_uses_client() {
        let ctx = Context {
            relay_url: Some("http://127.0.0.1:9".into()),
            ..Context::default()
        };
        assert!(open_relay(&ctx, &Config::default()).await.is_ok());
    }
}
