//! cli::commands::repos
//!
//! List repositories visible to the current token.

use anyhow::Result;

use super::{open_relay, runtime};
use crate::cli::Context;
use crate::relay::RelayError;

/// Print one repository per line, most recently updated first.
pub fn repos(ctx: &Context) -> Result<()> {
    runtime()?.block_on(repos_async(ctx))
}

async fn repos_async(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let relay = open_relay(ctx, &config).await?;

    let repos = relay.list_repositories().await.map_err(|e| match e {
        RelayError::Unauthenticated => {
            anyhow::anyhow!("Not authenticated. Run 'repodesk auth' or set GITHUB_TOKEN.")
        }
        other => anyhow::Error::new(other),
    })?;

    if repos.is_empty() && !ctx.quiet {
        println!("No repositories.");
    }
    for repo in repos {
        if ctx.quiet {
            println!("{}", repo.full_name);
            continue;
        }
        let visibility = if repo.private { "private" } else { "public" };
        match repo.description.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => println!("{:<40} {:<8} {}", repo.full_name, visibility, desc),
            None => println!("{:<40} {}", repo.full_name, visibility),
        }
    }
    Ok(())
}
