//! cli::commands::cat
//!
//! Print a file's decoded text.

use std::io::Write;

use anyhow::Result;

use super::{explain, open_relay, parse_repo, runtime};
use crate::cli::Context;
use crate::workspace::Workspace;

/// Write the file's text to stdout exactly as stored.
pub fn cat(ctx: &Context, repo: &str, path: &str) -> Result<()> {
    let repo = parse_repo(repo)?;
    let text = runtime()?.block_on(async {
        let config = ctx.config()?;
        let ws = Workspace::from_config(open_relay(ctx, &config).await?, &config);
        ws.load_root(repo).await.map_err(explain)?;
        let session = ws.open_file(path).await.map_err(explain)?;
        anyhow::Ok(session.saved_text().to_string())
    })?;

    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
