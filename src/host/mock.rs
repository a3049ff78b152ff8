//! host::mock
//!
//! Mock host implementation for deterministic testing.
//!
//! # Design
//!
//! The mock host keeps repositories and their files in memory, computes a
//! content sha for every file, and enforces the same write precondition
//! as the real API (a stale or missing sha is a `Conflict`). Failures can be
//! injected per operation and every call is recorded for verification.
//! An optional latency makes in-flight overlap observable in tests.
//!
//! # Example
//!
//! ```
//! use repodesk::host::mock::MockHost;
//! use repodesk::host::{Contents, Host};
//!
//! # tokio_test::block_on(async {
//! let host = MockHost::new()
//!     .with_file("octo", "demo", "src/main.rs", "fn main() {}\n");
//!
//! match host.get_contents("octo", "demo", "").await.unwrap() {
//!     Contents::Directory(entries) => assert_eq!(entries[0].name, "src"),
//!     Contents::File(_) => unreachable!(),
//! }
//! # });
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::codec;
use super::traits::{
    ContentEntry, Contents, EntryKind, FileEntry, Host, HostError, HostUser, ListReposOpts,
    PutContentsRequest, PutContentsResponse, Repository, RepositoryOwner,
};

/// Mock host for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockHostInner {
    /// Account returned by `authenticated_user`.
    user: HostUser,
    /// Repositories in listing order.
    repositories: Vec<Repository>,
    /// Files per `owner/name`, keyed by path.
    files: HashMap<String, BTreeMap<String, Vec<u8>>>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Delay applied to contents calls.
    latency: Option<Duration>,
    /// Commits recorded so far.
    commit_count: u64,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail authenticated_user with the given error.
    AuthenticatedUser(HostError),
    /// Fail list_repositories with the given error.
    ListRepositories(HostError),
    /// Fail get_contents with the given error.
    GetContents(HostError),
    /// Fail put_contents with the given error.
    PutContents(HostError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    AuthenticatedUser,
    ListRepositories {
        page: u32,
    },
    GetContents {
        owner: String,
        repo: String,
        path: String,
    },
    PutContents {
        owner: String,
        repo: String,
        path: String,
        sha: Option<String>,
        message: String,
    },
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// Create a new empty mock host.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockHostInner {
                user: HostUser {
                    id: 1,
                    login: "octocat".to_string(),
                    name: Some("The Octocat".to_string()),
                    email: Some("octocat@example.com".to_string()),
                    avatar_url: None,
                },
                repositories: Vec::new(),
                files: HashMap::new(),
                fail_on: None,
                latency: None,
                commit_count: 0,
                operations: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockHostInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a repository (with no files) to the listing.
    pub fn with_repository(self, owner: &str, name: &str) -> Self {
        {
            let mut inner = self.state();
            let full_name = format!("{}/{}", owner, name);
            if !inner.repositories.iter().any(|r| r.full_name == full_name) {
                let id = inner.repositories.len() as u64 + 1;
                inner.repositories.push(Repository {
                    id,
                    name: name.to_string(),
                    full_name: full_name.clone(),
                    description: None,
                    private: false,
                    owner: RepositoryOwner {
                        login: owner.to_string(),
                        avatar_url: String::new(),
                    },
                    html_url: format!("https://github.com/{}", full_name),
                    updated_at: None,
                    language: None,
                    stargazers_count: 0,
                    forks_count: 0,
                });
            }
            inner.files.entry(full_name).or_default();
        }
        self
    }

    /// Add a file, creating the repository if needed.
    pub fn with_file(self, owner: &str, name: &str, path: &str, text: &str) -> Self {
        let this = self.with_repository(owner, name);
        this.set_file(owner, name, path, text);
        this
    }

    /// Set the account returned by `authenticated_user`.
    pub fn with_user(self, user: HostUser) -> Self {
        self.state().user = user;
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use repodesk::host::mock::{FailOn, MockHost};
    /// use repodesk::host::HostError;
    ///
    /// let host = MockHost::new().fail_on(FailOn::GetContents(HostError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure a failure on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        self.state().fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Delay every contents call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = Some(latency);
        self
    }

    /// Write a file directly, as an upstream change would. Returns its new sha.
    pub fn set_file(&self, owner: &str, name: &str, path: &str, text: &str) -> String {
        let mut inner = self.state();
        inner
            .files
            .entry(format!("{}/{}", owner, name))
            .or_default()
            .insert(path.to_string(), text.as_bytes().to_vec());
        blob_sha(text.as_bytes())
    }

    /// Read a file's current text (for test verification).
    pub fn file_text(&self, owner: &str, name: &str, path: &str) -> Option<String> {
        let inner = self.state();
        inner
            .files
            .get(&format!("{}/{}", owner, name))
            .and_then(|files| files.get(path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Count recorded `get_contents` calls for one path.
    pub fn get_contents_calls(&self, path: &str) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::GetContents { path: p, .. } if p == path))
            .count()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), HostError> {
        let inner = self.state();
        match &inner.fail_on {
            Some(FailOn::AuthenticatedUser(e)) if expected == "authenticated_user" => {
                Err(e.clone())
            }
            Some(FailOn::ListRepositories(e)) if expected == "list_repositories" => Err(e.clone()),
            Some(FailOn::GetContents(e)) if expected == "get_contents" => Err(e.clone()),
            Some(FailOn::PutContents(e)) if expected == "put_contents" => Err(e.clone()),
            _ => Ok(()),
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Content sha for a file body.
fn blob_sha(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    hex::encode(hasher.finalize())[..40].to_string()
}

/// Sha standing in for a tree object.
fn tree_sha(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"tree ");
    hasher.update(path.as_bytes());
    hex::encode(hasher.finalize())[..40].to_string()
}

fn file_entry(path: &str, bytes: &[u8]) -> ContentEntry {
    ContentEntry {
        name: crate::core::types::file_name(path).to_string(),
        path: path.to_string(),
        kind: EntryKind::File,
        sha: blob_sha(bytes),
        size: Some(bytes.len() as u64),
    }
}

/// List the direct children of `dir` implied by the stored file paths.
fn list_dir(files: &BTreeMap<String, Vec<u8>>, dir: &str) -> Option<Vec<ContentEntry>> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    };

    let mut dirs = BTreeSet::new();
    let mut entries = Vec::new();
    for (path, bytes) in files.range(prefix.clone()..) {
        let Some(rest) = path.strip_prefix(&prefix) else {
            break;
        };
        match rest.split_once('/') {
            Some((child, _)) => {
                dirs.insert(child.to_string());
            }
            None => entries.push(file_entry(path, bytes)),
        }
    }

    if dirs.is_empty() && entries.is_empty() {
        return if dir.is_empty() { Some(Vec::new()) } else { None };
    }

    let mut listing: Vec<ContentEntry> = dirs
        .into_iter()
        .map(|name| {
            let path = format!("{}{}", prefix, name);
            ContentEntry {
                sha: tree_sha(&path),
                name,
                path,
                kind: EntryKind::Dir,
                size: Some(0),
            }
        })
        .collect();
    listing.extend(entries);
    Some(listing)
}

#[async_trait]
impl Host for MockHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authenticated_user(&self) -> Result<HostUser, HostError> {
        self.record(MockOperation::AuthenticatedUser);
        self.check_fail("authenticated_user")?;
        Ok(self.state().user.clone())
    }

    async fn list_repositories(&self, opts: ListReposOpts) -> Result<Vec<Repository>, HostError> {
        self.record(MockOperation::ListRepositories { page: opts.page });
        self.check_fail("list_repositories")?;

        let inner = self.state();
        let per_page = opts.per_page.max(1) as usize;
        let start = (opts.page.max(1) as usize - 1) * per_page;
        Ok(inner
            .repositories
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect())
    }

    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Contents, HostError> {
        self.record(MockOperation::GetContents {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
        });
        self.simulate_latency().await;
        self.check_fail("get_contents")?;

        let inner = self.state();
        let key = format!("{}/{}", owner, repo);
        let files = inner
            .files
            .get(&key)
            .ok_or_else(|| HostError::NotFound(format!("repository {}", key)))?;

        if let Some(bytes) = files.get(path) {
            return Ok(Contents::File(FileEntry {
                entry: file_entry(path, bytes),
                content_base64: codec::encode_text(&String::from_utf8_lossy(bytes)),
            }));
        }

        list_dir(files, path)
            .map(Contents::Directory)
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }

    async fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: PutContentsRequest,
    ) -> Result<PutContentsResponse, HostError> {
        self.record(MockOperation::PutContents {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            sha: request.sha.clone(),
            message: request.message.clone(),
        });
        self.simulate_latency().await;
        self.check_fail("put_contents")?;

        let bytes = codec::decode_bytes(&request.content_base64).map_err(|e| {
            HostError::ApiError {
                status: 422,
                message: e.to_string(),
            }
        })?;

        let mut inner = self.state();
        let key = format!("{}/{}", owner, repo);
        let files = inner
            .files
            .get_mut(&key)
            .ok_or_else(|| HostError::NotFound(format!("repository {}", key)))?;

        let current = files.get(path).map(|b| blob_sha(b));
        match (&current, &request.sha) {
            (Some(current), Some(sent)) if current != sent => {
                return Err(HostError::Conflict(format!(
                    "{} is at {} but expected {}",
                    path, current, sent
                )));
            }
            (Some(_), None) => {
                return Err(HostError::Conflict(format!(
                    "\"sha\" wasn't supplied for existing {}",
                    path
                )));
            }
            (None, Some(_)) => {
                return Err(HostError::Conflict(format!("{} does not exist", path)));
            }
            _ => {}
        }

        let entry = file_entry(path, &bytes);
        files.insert(path.to_string(), bytes);
        inner.commit_count += 1;
        let commit_sha = blob_sha(format!("commit {}", inner.commit_count).as_bytes());

        Ok(PutContentsResponse {
            content: entry,
            commit_sha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> MockHost {
        MockHost::new()
            .with_file("o", "r", "README.md", "# hi\n")
            .with_file("o", "r", "src/index.ts", "export {}\n")
            .with_file("o", "r", "src/util/math.ts", "1 + 1\n")
    }

    async fn listing(host: &MockHost, path: &str) -> Vec<ContentEntry> {
        match host.get_contents("o", "r", path).await.unwrap() {
            Contents::Directory(entries) => entries,
            Contents::File(_) => panic!("expected directory"),
        }
    }

    #[tokio::test]
    async fn root_lists_dirs_then_files() {
        let host = host();
        let root = listing(&host, "").await;
        let names: Vec<_> = root.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![("src", EntryKind::Dir), ("README.md", EntryKind::File)]
        );
    }

    #[tokio::test]
    async fn nested_listing_uses_full_paths() {
        let host = host();
        let src = listing(&host, "src").await;
        assert_eq!(src[0].path, "src/util");
        assert_eq!(src[1].path, "src/index.ts");
    }

    #[tokio::test]
    async fn file_contents_are_base64() {
        let host = host();
        match host.get_contents("o", "r", "README.md").await.unwrap() {
            Contents::File(file) => {
                assert_eq!(codec::decode_text(&file.content_base64).unwrap(), "# hi\n");
                assert_eq!(file.entry.size, Some(5));
            }
            Contents::Directory(_) => panic!("expected file"),
        }
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let host = host();
        let err = host.get_contents("o", "r", "nope").await.unwrap_err();
        assert!(matches!(err, HostError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_repository_root_is_empty_listing() {
        let host = MockHost::new().with_repository("o", "empty");
        match host.get_contents("o", "empty", "").await.unwrap() {
            Contents::Directory(entries) => assert!(entries.is_empty()),
            Contents::File(_) => panic!("expected directory"),
        }
    }

    #[tokio::test]
    async fn put_with_current_sha_updates() {
        let host = host();
        let sha = blob_sha(b"# hi\n");
        let result = host
            .put_contents(
                "o",
                "r",
                "README.md",
                PutContentsRequest {
                    message: "Update README.md".into(),
                    content_base64: codec::encode_text("# bye\n"),
                    sha: Some(sha.clone()),
                },
            )
            .await
            .unwrap();
        assert_ne!(result.content.sha, sha);
        assert_eq!(host.file_text("o", "r", "README.md").unwrap(), "# bye\n");
    }

    #[tokio::test]
    async fn put_with_stale_sha_conflicts() {
        let host = host();
        let err = host
            .put_contents(
                "o",
                "r",
                "README.md",
                PutContentsRequest {
                    message: "m".into(),
                    content_base64: codec::encode_text("x"),
                    sha: Some("0000".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Conflict(_)));
        assert_eq!(host.file_text("o", "r", "README.md").unwrap(), "# hi\n");
    }

    #[tokio::test]
    async fn create_without_sha() {
        let host = host();
        host.put_contents(
            "o",
            "r",
            "docs/new.md",
            PutContentsRequest {
                message: "Create docs/new.md".into(),
                content_base64: codec::encode_text("new"),
                sha: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(host.file_text("o", "r", "docs/new.md").unwrap(), "new");
    }

    #[tokio::test]
    async fn fail_on_injects_error() {
        let host = host().fail_on(FailOn::GetContents(HostError::RateLimited));
        assert!(matches!(
            host.get_contents("o", "r", "").await,
            Err(HostError::RateLimited)
        ));
        host.clear_fail_on();
        assert!(host.get_contents("o", "r", "").await.is_ok());
    }

    #[tokio::test]
    async fn repositories_are_paged() {
        let mut host = MockHost::new();
        for i in 0..5 {
            host = host.with_repository("o", &format!("r{}", i));
        }
        let page2 = host
            .list_repositories(ListReposOpts {
                page: 2,
                per_page: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = page2.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r2", "r3"]);
    }

    #[tokio::test]
    async fn operations_are_recorded() {
        let host = host();
        host.get_contents("o", "r", "src").await.unwrap();
        host.get_contents("o", "r", "src").await.unwrap();
        assert_eq!(host.get_contents_calls("src"), 2);
        host.clear_operations();
        assert!(host.operations().is_empty());
    }
}
