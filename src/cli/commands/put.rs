//! cli::commands::put
//!
//! Replace a file's text through an edit session.
//!
//! # Design
//!
//! `put` is open, edit, save: the file is loaded to get its version token,
//! the working text is replaced, and the save carries that token. A file
//! changed upstream in between fails as stale; identical text saves
//! nothing.

use std::path::Path;

use anyhow::Result;

use super::{explain, open_relay, parse_repo, read_input, runtime};
use crate::cli::Context;
use crate::workspace::{SaveOutcome, Workspace};

/// Replace the text of `path` with the contents of `from` and commit it.
pub fn put(
    ctx: &Context,
    repo: &str,
    path: &str,
    from: &Path,
    message: Option<&str>,
) -> Result<()> {
    let repo = parse_repo(repo)?;
    let text = read_input(from)?;

    let outcome = runtime()?.block_on(async {
        let config = ctx.config()?;
        let ws = Workspace::from_config(open_relay(ctx, &config).await?, &config);
        ws.load_root(repo).await.map_err(explain)?;
        ws.open_file(path).await.map_err(explain)?;
        ws.edit(text).map_err(explain)?;
        ws.save_with_message(message).await.map_err(explain)
    })?;

    if !ctx.quiet {
        match outcome {
            SaveOutcome::NoChanges => println!("{} is unchanged; nothing to commit.", path),
            SaveOutcome::Saved { version_token, .. } => {
                println!("Saved {} ({})", path, short(&version_token))
            }
        }
    }
    Ok(())
}

pub(super) fn short(token: &str) -> &str {
    token.get(..7).unwrap_or(token)
}
