//! relay::direct
//!
//! In-process relay over a [`Host`].
//!
//! # Design
//!
//! `HostRelay` is stateless apart from the host handle: each call is one
//! (or, for repository paging, a few) host requests. Host errors are mapped
//! by direction. On reads everything except an auth failure is
//! `FetchFailed`; on writes a precondition conflict is `StaleVersion` and
//! everything else is `SaveFailed`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ContentRelay, FileText, PathContents, RelayError, TreeNode, WriteReceipt};
use crate::core::types::RepoRef;
use crate::host::{codec, Contents, Host, HostError, ListReposOpts, PutContentsRequest, Repository};

/// Host page size for repository listings.
const REPO_PAGE_SIZE: u32 = 100;

/// Relay that calls a [`Host`] directly.
#[derive(Clone)]
pub struct HostRelay {
    host: Arc<dyn Host>,
    repo_pages: u32,
}

impl std::fmt::Debug for HostRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRelay")
            .field("host", &self.host.name())
            .field("repo_pages", &self.repo_pages)
            .finish()
    }
}

impl HostRelay {
    /// Create a relay fetching a single page of repositories.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            repo_pages: 1,
        }
    }

    /// Fetch up to `pages` pages of repositories (minimum 1).
    pub fn with_repo_pages(mut self, pages: u32) -> Self {
        self.repo_pages = pages.max(1);
        self
    }

    /// The underlying host.
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Decoded file text, or the listing when `path` is a directory.
    pub async fn read_path(&self, repo: &RepoRef, path: &str) -> Result<PathContents, RelayError> {
        debug!(%repo, path, "reading path");
        let contents = self
            .host
            .get_contents(repo.owner(), repo.name(), path)
            .await
            .map_err(read_error)?;

        match contents {
            Contents::File(file) => {
                let text = codec::decode_text(&file.content_base64)
                    .map_err(|e| RelayError::FetchFailed(e.to_string()))?;
                Ok(PathContents::File(FileText {
                    path: file.entry.path,
                    text,
                    version_token: file.entry.sha,
                }))
            }
            Contents::Directory(entries) => Ok(PathContents::Directory(
                entries.into_iter().map(TreeNode::from).collect(),
            )),
        }
    }
}

fn read_error(err: HostError) -> RelayError {
    match err {
        HostError::AuthRequired | HostError::AuthFailed(_) => RelayError::Unauthenticated,
        other => RelayError::FetchFailed(other.to_string()),
    }
}

fn write_error(err: HostError) -> RelayError {
    match err {
        HostError::AuthRequired | HostError::AuthFailed(_) => RelayError::Unauthenticated,
        HostError::Conflict(msg) => RelayError::StaleVersion(msg),
        other => RelayError::SaveFailed(other.to_string()),
    }
}

#[async_trait]
impl ContentRelay for HostRelay {
    async fn list_repositories(&self) -> Result<Vec<Repository>, RelayError> {
        let mut repos = Vec::new();
        for page in 1..=self.repo_pages {
            let batch = self
                .host
                .list_repositories(ListReposOpts {
                    page,
                    per_page: REPO_PAGE_SIZE,
                    ..Default::default()
                })
                .await
                .map_err(read_error)?;
            let short = (batch.len() as u32) < REPO_PAGE_SIZE;
            repos.extend(batch);
            if short {
                break;
            }
        }
        debug!(count = repos.len(), "listed repositories");
        Ok(repos)
    }

    async fn list_directory(
        &self,
        repo: &RepoRef,
        path: &str,
    ) -> Result<Vec<TreeNode>, RelayError> {
        debug!(%repo, path, "listing directory");
        let contents = self
            .host
            .get_contents(repo.owner(), repo.name(), path)
            .await
            .map_err(read_error)?;

        Ok(match contents {
            Contents::Directory(entries) => entries.into_iter().map(TreeNode::from).collect(),
            // A path naming a single file lists as that one entry.
            Contents::File(file) => vec![TreeNode::from(file.entry)],
        })
    }

    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<FileText, RelayError> {
        match self.read_path(repo, path).await? {
            PathContents::File(file) => Ok(file),
            PathContents::Directory(_) => Err(RelayError::FetchFailed(format!(
                "{} is a directory",
                path
            ))),
        }
    }

    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        text: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<WriteReceipt, RelayError> {
        debug!(%repo, path, create = version_token.is_none(), "writing file");
        let request = PutContentsRequest {
            message: message.to_string(),
            content_base64: codec::encode_text(text),
            sha: version_token.map(str::to_string),
        };

        let response = self
            .host
            .put_contents(repo.owner(), repo.name(), path, request)
            .await
            .map_err(|e| {
                let mapped = write_error(e);
                if matches!(mapped, RelayError::StaleVersion(_)) {
                    warn!(%repo, path, "write rejected: version token is stale");
                }
                mapped
            })?;

        Ok(WriteReceipt {
            version_token: response.content.sha,
        })
    }
}
