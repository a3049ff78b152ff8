//! relay::types
//!
//! Values exchanged between the editor core and a content relay.
//!
//! Field names on the wire follow the browser client's contract: node kind
//! is `type` (`"file"` / `"dir"`), version tokens travel as `sha`, and file
//! text as `decodedContent`.

use serde::{Deserialize, Serialize};

use crate::core::types::file_name;
use crate::host::{ContentEntry, EntryKind};

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

impl NodeKind {
    pub fn is_directory(self) -> bool {
        matches!(self, NodeKind::Directory)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Directory => write!(f, "dir"),
        }
    }
}

impl From<EntryKind> for NodeKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Dir => NodeKind::Directory,
            // Symlinks and submodules open as files; the host resolves them.
            EntryKind::File | EntryKind::Symlink | EntryKind::Submodule => NodeKind::File,
        }
    }
}

/// One file-or-directory entry of a repository tree.
///
/// Children are not embedded; they live in the workspace cache keyed by
/// this node's `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(rename = "sha", default, skip_serializing_if = "Option::is_none")]
    pub version_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeNode {
    /// Build a node from just a path, deriving the name.
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            kind,
            version_token: None,
            size: None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }
}

impl From<ContentEntry> for TreeNode {
    fn from(entry: ContentEntry) -> Self {
        Self {
            name: entry.name,
            path: entry.path,
            kind: entry.kind.into(),
            version_token: Some(entry.sha),
            size: entry.size,
        }
    }
}

/// A file's decoded text and the token that guards writes to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileText {
    pub path: String,
    #[serde(rename = "decodedContent")]
    pub text: String,
    #[serde(rename = "sha")]
    pub version_token: String,
}

/// Whatever lives at a path: a file's text or a directory's listing.
///
/// Serializes as the bare [`FileText`] object or the bare listing array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathContents {
    File(FileText),
    Directory(Vec<TreeNode>),
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    #[serde(rename = "sha")]
    pub version_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_node_wire_shape() {
        let node = TreeNode {
            name: "src".into(),
            path: "src".into(),
            kind: NodeKind::Directory,
            version_token: Some("abc".into()),
            size: None,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "src", "path": "src", "type": "dir", "sha": "abc"})
        );
    }

    #[test]
    fn tree_node_from_entry() {
        let entry = ContentEntry {
            name: "link".into(),
            path: "docs/link".into(),
            kind: EntryKind::Symlink,
            sha: "s".into(),
            size: Some(9),
        };
        let node = TreeNode::from(entry);
        assert_eq!(node.kind, NodeKind::File);
        assert_eq!(node.version_token.as_deref(), Some("s"));
    }

    #[test]
    fn new_derives_name() {
        let node = TreeNode::new("a/b/c.rs", NodeKind::File);
        assert_eq!(node.name, "c.rs");
        assert!(!node.is_directory());
    }

    #[test]
    fn file_text_wire_shape() {
        let text = FileText {
            path: "README.md".into(),
            text: "hi".into(),
            version_token: "t1".into(),
        };
        let json = serde_json::to_string(&text).unwrap();
        assert!(json.contains(r#""decodedContent":"hi""#));
        assert!(json.contains(r#""sha":"t1""#));
    }
}
