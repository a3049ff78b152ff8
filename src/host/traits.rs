//! host::traits
//!
//! Host trait definition for the source-control REST API.
//!
//! # Design
//!
//! The `Host` trait is async because every operation is network I/O.
//! Types here mirror the host's wire shapes closely; reshaping into the
//! editor's tree model happens one layer up in [`crate::relay`].
//!
//! # Example
//!
//! ```ignore
//! use repodesk::host::{Host, HostError, Contents};
//!
//! async fn print_root(host: &dyn Host) -> Result<(), HostError> {
//!     match host.get_contents("octocat", "hello-world", "").await? {
//!         Contents::Directory(entries) => {
//!             for entry in entries {
//!                 println!("{} ({})", entry.path, entry.kind);
//!             }
//!         }
//!         Contents::File(file) => println!("single file: {}", file.entry.path),
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from host operations.
///
/// These map to the failure modes of the host's REST API.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// The token was rejected (invalid or expired).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The token is valid but may not access the resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write precondition failed: the supplied sha no longer matches.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Sort order for repository listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoSort {
    /// Most recently updated first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Most recently pushed first
    Pushed,
    /// Alphabetical by full name
    FullName,
}

impl std::fmt::Display for RepoSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoSort::Updated => write!(f, "updated"),
            RepoSort::Created => write!(f, "created"),
            RepoSort::Pushed => write!(f, "pushed"),
            RepoSort::FullName => write!(f, "full_name"),
        }
    }
}

/// Options for listing the authenticated user's repositories.
#[derive(Debug, Clone)]
pub struct ListReposOpts {
    /// 1-based page number
    pub page: u32,
    /// Page size (host maximum is 100)
    pub per_page: u32,
    /// Sort order
    pub sort: RepoSort,
}

impl Default for ListReposOpts {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 100,
            sort: RepoSort::Updated,
        }
    }
}

/// Owner summary embedded in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Repository metadata, mirrored verbatim from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

/// The authenticated account, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Kind of a contents entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Dir => write!(f, "dir"),
            EntryKind::Symlink => write!(f, "symlink"),
            EntryKind::Submodule => write!(f, "submodule"),
        }
    }
}

/// One entry of a contents listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A single file's contents response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Listing metadata for the file
    pub entry: ContentEntry,
    /// Base64 payload as sent by the host (may contain line breaks)
    pub content_base64: String,
}

/// Result of a contents request: a listing or a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    Directory(Vec<ContentEntry>),
    File(FileEntry),
}

/// Request to create or update a file.
#[derive(Debug, Clone)]
pub struct PutContentsRequest {
    /// Commit message
    pub message: String,
    /// New file content, base64-encoded
    pub content_base64: String,
    /// Blob sha being replaced; `None` creates the file
    pub sha: Option<String>,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutContentsResponse {
    /// The written file's new listing entry (carries the new blob sha)
    pub content: ContentEntry,
    /// Sha of the commit that recorded the write
    pub commit_sha: String,
}

/// The Host trait for the source-control REST API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, HostError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: the session has no usable token
/// - `PermissionDenied`: signed in, but no access to this resource
/// - `NotFound`: path or repository doesn't exist
/// - `Conflict`: a write raced an upstream change
/// - `RateLimited`, `ApiError`, `NetworkError`: report and let the user retry
#[async_trait]
pub trait Host: Send + Sync {
    /// Get the host name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Get the account the token belongs to.
    async fn authenticated_user(&self) -> Result<HostUser, HostError>;

    /// List repositories visible to the authenticated account.
    async fn list_repositories(&self, opts: ListReposOpts) -> Result<Vec<Repository>, HostError>;

    /// Get the contents at `path` (empty for the repository root).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the path doesn't exist
    async fn get_contents(&self, owner: &str, repo: &str, path: &str)
        -> Result<Contents, HostError>;

    /// Create or update the file at `path`.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `request.sha` doesn't match the current blob, or if it
    ///   is missing for a file that already exists
    async fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: PutContentsRequest,
    ) -> Result<PutContentsResponse, HostError>;
}
