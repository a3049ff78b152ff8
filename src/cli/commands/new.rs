//! cli::commands::new

use std::path::Path;

use anyhow::Result;

use super::put::short;
use super::{explain, open_relay, parse_repo, read_input, runtime};
use crate::cli::Context;
use crate::workspace::Workspace;

/// Create `path` with the contents of `from`.
pub fn new_file(
    ctx: &Context,
    repo: &str,
    path: &str,
    from: &Path,
    message: Option<&str>,
) -> Result<()> {
    let repo = parse_repo(repo)?;
    let text = read_input(from)?;

    let node = runtime()?.block_on(async {
        let config = ctx.config()?;
        let ws = Workspace::from_config(open_relay(ctx, &config).await?, &config);
        ws.load_root(repo).await.map_err(explain)?;
        ws.create_file(path, &text, message).await.map_err(explain)
    })?;

    if !ctx.quiet {
        let token = node.version_token.as_deref().unwrap_or_default();
        println!("Created {} ({})", node.path, short(token));
    }
    Ok(())
}
