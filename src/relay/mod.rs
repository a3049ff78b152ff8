//! relay
//!
//! The content relay: file operations translated into authenticated host
//! calls.
//!
//! # Architecture
//!
//! The editor core only ever talks to a [`ContentRelay`]. Two
//! implementations exist:
//!
//! - [`HostRelay`]: in-process, wraps any [`crate::host::Host`]
//! - [`RelayClient`]: over HTTP, against a running `repodesk serve`
//!
//! Both collapse host failures into the four-way [`RelayError`] taxonomy.
//! Nothing is retried here; every failure goes back to the caller.

mod client;
mod direct;
mod types;

pub use client::{RelayClient, SESSION_COOKIE};
pub use direct::HostRelay;
pub use types::{FileText, NodeKind, PathContents, TreeNode, WriteReceipt};

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::RepoRef;
use crate::host::Repository;

/// Errors from relay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No valid session or token.
    #[error("not authenticated")]
    Unauthenticated,

    /// A read from the host failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A write to the host failed.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// The write's version token no longer matches the host.
    #[error("stale version: {0}")]
    StaleVersion(String),
}

/// File operations the editor core needs from the host.
#[async_trait]
pub trait ContentRelay: Send + Sync {
    /// Repositories visible to the current user, most recently updated first.
    async fn list_repositories(&self) -> Result<Vec<Repository>, RelayError>;

    /// Entries of the directory at `path` (`""` is the root), in host order.
    async fn list_directory(&self, repo: &RepoRef, path: &str)
        -> Result<Vec<TreeNode>, RelayError>;

    /// Decoded text of the file at `path`.
    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<FileText, RelayError>;

    /// Write `text` to `path`.
    ///
    /// `version_token` is the write precondition; `None` creates the file.
    /// A token that no longer matches fails with `StaleVersion`.
    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        text: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<WriteReceipt, RelayError>;
}
