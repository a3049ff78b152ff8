//! workspace::tree
//!
//! Directory listings keyed by path.
//!
//! # Design
//!
//! The tree is an arena indexed by directory path: each expanded directory
//! maps to the ordered nodes of its latest listing, and nodes never point
//! at their children. The root's key is `""`. Keys are exact host paths;
//! nothing is normalized.

use std::collections::{HashMap, HashSet};

use crate::core::types::{parent_path, ROOT_PATH};
use crate::relay::TreeNode;

/// One line of the explorer: a node, its depth, and its expansion state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub node: TreeNode,
    pub expanded: bool,
    pub loading: bool,
}

/// Listings fetched this session.
#[derive(Debug, Default)]
pub(crate) struct DirectoryCache {
    listings: HashMap<String, Vec<TreeNode>>,
}

impl DirectoryCache {
    pub fn get(&self, path: &str) -> Option<&Vec<TreeNode>> {
        self.listings.get(path)
    }

    /// Replace the listing for `path` wholesale.
    pub fn insert(&mut self, path: &str, nodes: Vec<TreeNode>) {
        self.listings.insert(path.to_string(), nodes);
    }

    pub fn clear(&mut self) {
        self.listings.clear();
    }

    /// The node at `path`, if its parent has been listed.
    pub fn node(&self, path: &str) -> Option<&TreeNode> {
        self.listings
            .get(parent_path(path))?
            .iter()
            .find(|n| n.path == path)
    }

    /// Insert or replace a node in its parent's listing, if that listing is
    /// cached. Returns whether the listing was touched.
    pub fn upsert(&mut self, node: TreeNode) -> bool {
        let Some(siblings) = self.listings.get_mut(parent_path(&node.path)) else {
            return false;
        };
        match siblings.iter_mut().find(|n| n.path == node.path) {
            Some(existing) => *existing = node,
            None => siblings.push(node),
        }
        true
    }

    /// Update the version token of a cached file node.
    pub fn set_token(&mut self, path: &str, token: &str) {
        if let Some(node) = self
            .listings
            .get_mut(parent_path(path))
            .and_then(|siblings| siblings.iter_mut().find(|n| n.path == path))
        {
            node.version_token = Some(token.to_string());
        }
    }

    /// Depth-first flattening of the root and every expanded directory.
    pub fn rows(&self, expanded: &HashSet<String>, loading: &HashSet<String>) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.walk(ROOT_PATH, 0, expanded, loading, &mut rows);
        rows
    }

    fn walk(
        &self,
        dir: &str,
        depth: usize,
        expanded: &HashSet<String>,
        loading: &HashSet<String>,
        rows: &mut Vec<TreeRow>,
    ) {
        let Some(children) = self.listings.get(dir) else {
            return;
        };
        for node in children {
            let is_open = node.is_directory() && expanded.contains(&node.path);
            rows.push(TreeRow {
                depth,
                node: node.clone(),
                expanded: is_open,
                loading: loading.contains(&node.path),
            });
            // A listing naming itself (a file path listed as one entry)
            // would recurse forever.
            if is_open && node.path != dir {
                self.walk(&node.path, depth + 1, expanded, loading, rows);
            }
        }
    }
}
