//! cli::commands::tree
//!
//! Print a repository's file tree, expanding the requested directories.

use anyhow::Result;

use super::{explain, open_relay, parse_repo, runtime};
use crate::cli::Context;
use crate::core::types::parent_path;
use crate::workspace::{TreeRow, Workspace};

/// Load the root, expand each `--expand` directory (and its parents), and
/// print the visible rows.
pub fn tree(ctx: &Context, repo: &str, expand: &[String]) -> Result<()> {
    let repo = parse_repo(repo)?;
    runtime()?.block_on(async {
        let config = ctx.config()?;
        let ws = Workspace::from_config(open_relay(ctx, &config).await?, &config);

        ws.load_root(repo).await.map_err(explain)?;
        for dir in expand {
            for ancestor in ancestors(dir.trim_matches('/')) {
                ws.expand(&ancestor).await.map_err(explain)?;
            }
        }

        for row in ws.visible_rows() {
            println!("{}", render(&row));
        }
        Ok(())
    })
}

/// `a/b/c` yields `a`, `a/b`, `a/b/c`.
fn ancestors(path: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = path;
    while !current.is_empty() {
        chain.push(current.to_string());
        current = parent_path(current);
    }
    chain.reverse();
    chain
}

fn render(row: &TreeRow) -> String {
    let indent = "  ".repeat(row.depth);
    if row.node.is_directory() {
        format!("{}{}/", indent, row.node.name)
    } else {
        format!("{}{}", indent, row.node.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{NodeKind, TreeNode};

    #[test]
    fn ancestors_in_order() {
        assert_eq!(ancestors("a/b/c"), vec!["a", "a/b", "a/b/c"]);
        assert_eq!(ancestors("src"), vec!["src"]);
        assert!(ancestors("").is_empty());
    }

    #[test]
    fn directories_get_a_slash() {
        let row = TreeRow {
            depth: 1,
            node: TreeNode::new("src/util", NodeKind::Directory),
            expanded: false,
            loading: false,
        };
        assert_eq!(render(&row), "  util/");
    }
}
