//! workspace
//!
//! The tree cache and edit buffer: one repository view's browsing and
//! editing state.
//!
//! # Architecture
//!
//! [`Workspace`] owns everything a file explorer and an editor pane render
//! from:
//!
//! - a directory cache (listings keyed by path, root is `""`)
//! - the set of expanded directories
//! - at most one [`EditSession`]
//!
//! All I/O goes through a [`ContentRelay`]. Methods take `&self` and keep
//! state behind a synchronous mutex that is never held across an
//! `.await`, so a `Workspace` can be shared (`Arc<Workspace>`) between
//! tasks.
//!
//! # Concurrency
//!
//! - Concurrent `expand`/`refresh` calls for one path share a single
//!   in-flight fetch and all see its result, success or failure.
//! - `open_file` is last-invoked-wins: a load that resolves after a newer
//!   `open_file` (or `load_root`) returns [`WorkspaceError::Superseded`]
//!   and changes nothing.
//! - `load_root` starts a new cache epoch; listings fetched under an older
//!   epoch are never cached.
//! - Nothing is retried. Failures return to the caller with the state
//!   left as it was (or, for `open_file`, with no session).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use repodesk::core::types::RepoRef;
//! use repodesk::host::mock::MockHost;
//! use repodesk::relay::HostRelay;
//! use repodesk::workspace::{SaveOutcome, Workspace};
//!
//! # tokio_test::block_on(async {
//! let host = MockHost::new().with_file("octo", "demo", "src/index.ts", "let a = 1;\n");
//! let ws = Workspace::new(Arc::new(HostRelay::new(Arc::new(host))));
//!
//! ws.load_root(RepoRef::parse("octo/demo").unwrap()).await.unwrap();
//! ws.expand("src").await.unwrap();
//! ws.open_file("src/index.ts").await.unwrap();
//!
//! assert!(ws.edit("let a = 2;\n").unwrap());
//! assert!(matches!(ws.save().await.unwrap(), SaveOutcome::Saved { .. }));
//! assert!(!ws.session().unwrap().has_unsaved_changes());
//! # });
//! ```

mod session;
mod tree;

pub use session::{DiscardPolicy, EditSession, EditState};
pub use tree::TreeRow;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::core::config::{Config, DEFAULT_COMMIT_MESSAGE};
use crate::core::types::{file_name, RepoRef, ROOT_PATH};
use crate::relay::{ContentRelay, NodeKind, RelayError, TreeNode};
use tree::DirectoryCache;

/// Commit message used by `create_file` when none is given.
pub const DEFAULT_CREATE_MESSAGE: &str = "Create {path}";

/// Errors from workspace operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// No valid session or token.
    #[error("not authenticated")]
    Unauthenticated,

    /// Reading from the host failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Writing to the host failed; the buffer is unchanged.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// The file changed upstream since it was loaded; the buffer is unchanged.
    #[error("file changed upstream: {0}")]
    StaleVersion(String),

    /// No repository has been loaded.
    #[error("no repository loaded")]
    NoRepository,

    /// No file is open.
    #[error("no file is open")]
    NoOpenFile,

    /// The path is a file, not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    /// The path is a directory, not a file.
    #[error("'{0}' is not a file")]
    NotAFile(String),

    /// The open file has unsaved changes and the discard policy protects them.
    #[error("'{0}' has unsaved changes")]
    UnsavedChanges(String),

    /// A newer `open_file` or `load_root` replaced this operation's result.
    #[error("superseded by a newer request")]
    Superseded,

    /// A save for the open file is already in flight.
    #[error("a save is already in progress")]
    SaveInProgress,
}

impl From<RelayError> for WorkspaceError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Unauthenticated => WorkspaceError::Unauthenticated,
            RelayError::FetchFailed(msg) => WorkspaceError::FetchFailed(msg),
            RelayError::SaveFailed(msg) => WorkspaceError::SaveFailed(msg),
            RelayError::StaleVersion(msg) => WorkspaceError::StaleVersion(msg),
        }
    }
}

impl WorkspaceError {
    /// Whether the caller should send the user to log in.
    pub fn needs_login(&self) -> bool {
        matches!(self, WorkspaceError::Unauthenticated)
    }
}

/// Result of [`Workspace::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The working text was written.
    Saved {
        /// New version token of the file.
        version_token: String,
        /// Whether edits made during the write are still unsaved.
        still_dirty: bool,
    },
    /// Nothing to save.
    NoChanges,
}

type ListingCell = Arc<OnceCell<Result<Vec<TreeNode>, RelayError>>>;

enum Buffer {
    NoFile,
    Loading { path: String },
    Open { session: EditSession, saving: bool },
}

impl Buffer {
    /// End the save started on the session opened at `generation`, if that
    /// session is still the open one.
    fn finish_save(&mut self, generation: u64) -> Option<&mut EditSession> {
        match self {
            Buffer::Open { session, saving } if session.generation == generation => {
                *saving = false;
                Some(session)
            }
            _ => None,
        }
    }

    /// Drop a load that never completed.
    fn abandon_load(&mut self) {
        if matches!(self, Buffer::Loading { .. }) {
            *self = Buffer::NoFile;
        }
    }
}

/// Runs its reset when dropped before [`disarm`](Self::disarm).
///
/// Edit-buffer operations mark the buffer before awaiting the relay; if the
/// future is dropped at that await, the mark would otherwise stay forever.
struct CancelGuard<F: FnOnce()> {
    reset: Option<F>,
}

impl<F: FnOnce()> CancelGuard<F> {
    fn new(reset: F) -> Self {
        Self { reset: Some(reset) }
    }

    fn disarm(&mut self) {
        self.reset = None;
    }
}

impl<F: FnOnce()> Drop for CancelGuard<F> {
    fn drop(&mut self) {
        if let Some(reset) = self.reset.take() {
            reset();
        }
    }
}

struct State {
    repo: Option<RepoRef>,
    /// Bumped by `load_root`; fetches from older epochs are not cached.
    epoch: u64,
    cache: DirectoryCache,
    expanded: HashSet<String>,
    in_flight: HashMap<String, ListingCell>,
    /// Bumped by every `open_file` and `load_root`.
    load_generation: u64,
    buffer: Buffer,
}

impl State {
    fn dirty_path(&self) -> Option<&str> {
        match &self.buffer {
            Buffer::Open { session, .. } if session.has_unsaved_changes() => {
                Some(session.file_path())
            }
            _ => None,
        }
    }

    fn guard_discard(&self, policy: DiscardPolicy) -> Result<(), WorkspaceError> {
        match (policy, self.dirty_path()) {
            (DiscardPolicy::Protect, Some(path)) => {
                Err(WorkspaceError::UnsavedChanges(path.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn kind_of(&self, path: &str) -> Option<NodeKind> {
        if path == ROOT_PATH {
            return Some(NodeKind::Directory);
        }
        self.cache.node(path).map(|n| n.kind)
    }
}

/// Lazily expanded file tree plus a single-file edit buffer.
pub struct Workspace {
    relay: Arc<dyn ContentRelay>,
    policy: DiscardPolicy,
    commit_template: String,
    state: Mutex<State>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("repository", &self.repository())
            .field("policy", &self.policy)
            .field("edit_state", &self.edit_state())
            .finish()
    }
}

impl Workspace {
    /// Empty workspace with the default policy and commit message.
    pub fn new(relay: Arc<dyn ContentRelay>) -> Self {
        Self {
            relay,
            policy: DiscardPolicy::default(),
            commit_template: DEFAULT_COMMIT_MESSAGE.to_string(),
            state: Mutex::new(State {
                repo: None,
                epoch: 0,
                cache: DirectoryCache::default(),
                expanded: HashSet::new(),
                in_flight: HashMap::new(),
                load_generation: 0,
                buffer: Buffer::NoFile,
            }),
        }
    }

    /// Workspace using the `[editor]` settings from `config`.
    pub fn from_config(relay: Arc<dyn ContentRelay>, config: &Config) -> Self {
        Self::new(relay)
            .with_discard_policy(config.discard_policy())
            .with_commit_template(config.commit_message_template())
    }

    pub fn with_discard_policy(mut self, policy: DiscardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Commit message template for `save`; `{name}` and `{path}` expand.
    pub fn with_commit_template(mut self, template: impl Into<String>) -> Self {
        self.commit_template = template.into();
        self
    }

    pub fn discard_policy(&self) -> DiscardPolicy {
        self.policy
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ----------------------------------------------------------------------
    // Tree
    // ----------------------------------------------------------------------

    /// Switch to `repo`: drop all listings and the open file, then fetch
    /// the root listing.
    ///
    /// # Errors
    ///
    /// - `UnsavedChanges` under [`DiscardPolicy::Protect`] with a dirty buffer
    /// - `FetchFailed` / `Unauthenticated`; the cache stays empty and a
    ///   retry is safe
    pub async fn load_root(&self, repo: RepoRef) -> Result<Vec<TreeNode>, WorkspaceError> {
        self.state().guard_discard(self.policy)?;
        self.load_root_discarding(repo).await
    }

    /// [`load_root`](Self::load_root) ignoring the discard policy.
    pub async fn load_root_discarding(
        &self,
        repo: RepoRef,
    ) -> Result<Vec<TreeNode>, WorkspaceError> {
        {
            let mut st = self.state();
            if let Some(path) = st.dirty_path() {
                warn!(%path, "discarding unsaved changes");
            }
            info!(%repo, "loading repository");
            st.repo = Some(repo);
            st.epoch += 1;
            st.cache.clear();
            st.expanded.clear();
            st.in_flight.clear();
            st.load_generation += 1;
            st.buffer = Buffer::NoFile;
        }
        self.fetch_listing(ROOT_PATH, true).await
    }

    /// Children of the directory at `path`, fetching them on first use.
    ///
    /// A cached listing is returned without a fetch. Concurrent callers
    /// for the same path share one fetch.
    ///
    /// # Errors
    ///
    /// - `NotADirectory` if `path` is a known file
    /// - `FetchFailed` / `Unauthenticated`; the directory stays collapsed
    /// - `Superseded` if `load_root` ran while the fetch was in flight
    pub async fn expand(&self, path: &str) -> Result<Vec<TreeNode>, WorkspaceError> {
        self.fetch_listing(path, false).await
    }

    /// Like [`expand`](Self::expand) but ignores and replaces any cached
    /// listing.
    pub async fn refresh(&self, path: &str) -> Result<Vec<TreeNode>, WorkspaceError> {
        self.fetch_listing(path, true).await
    }

    /// Mark `path` collapsed. Its listing stays cached.
    pub fn collapse(&self, path: &str) {
        self.state().expanded.remove(path);
    }

    async fn fetch_listing(
        &self,
        path: &str,
        force: bool,
    ) -> Result<Vec<TreeNode>, WorkspaceError> {
        let (repo, epoch, cell) = {
            let mut st = self.state();
            let repo = st.repo.clone().ok_or(WorkspaceError::NoRepository)?;
            if st.kind_of(path) == Some(NodeKind::File) {
                return Err(WorkspaceError::NotADirectory(path.to_string()));
            }
            if !force {
                if let Some(nodes) = st.cache.get(path).cloned() {
                    st.expanded.insert(path.to_string());
                    return Ok(nodes);
                }
            }
            let cell = st
                .in_flight
                .entry(path.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            (repo, st.epoch, cell)
        };

        let result = cell
            .get_or_init(|| async {
                debug!(%repo, path, "fetching listing");
                let result = self.relay.list_directory(&repo, path).await;

                let mut st = self.state();
                if st
                    .in_flight
                    .get(path)
                    .is_some_and(|current| Arc::ptr_eq(current, &cell))
                {
                    st.in_flight.remove(path);
                }
                if st.epoch == epoch {
                    if let Ok(nodes) = &result {
                        st.cache.insert(path, nodes.clone());
                        st.expanded.insert(path.to_string());
                    }
                }
                result
            })
            .await
            .clone();

        if self.state().epoch != epoch {
            debug!(path, "dropping listing from a previous repository");
            return Err(WorkspaceError::Superseded);
        }
        result.map_err(WorkspaceError::from)
    }

    // ----------------------------------------------------------------------
    // Edit buffer
    // ----------------------------------------------------------------------

    /// Open the file at `path`, replacing the current buffer.
    ///
    /// # Errors
    ///
    /// - `UnsavedChanges` under [`DiscardPolicy::Protect`] with a dirty buffer
    /// - `NotAFile` if `path` is a known directory
    /// - `FetchFailed` / `Unauthenticated`; no file is open afterwards
    /// - `Superseded` if a newer `open_file` or `load_root` started meanwhile
    pub async fn open_file(&self, path: &str) -> Result<EditSession, WorkspaceError> {
        self.state().guard_discard(self.policy)?;
        self.open_file_discarding(path).await
    }

    /// [`open_file`](Self::open_file) ignoring the discard policy.
    pub async fn open_file_discarding(&self, path: &str) -> Result<EditSession, WorkspaceError> {
        let (repo, generation) = {
            let mut st = self.state();
            let repo = st.repo.clone().ok_or(WorkspaceError::NoRepository)?;
            if st.kind_of(path) == Some(NodeKind::Directory) {
                return Err(WorkspaceError::NotAFile(path.to_string()));
            }
            if let Some(dirty) = st.dirty_path() {
                warn!(path = %dirty, "discarding unsaved changes");
            }
            st.load_generation += 1;
            st.buffer = Buffer::Loading {
                path: path.to_string(),
            };
            (repo, st.load_generation)
        };

        let mut cancel = CancelGuard::new(|| {
            let mut st = self.state();
            if st.load_generation == generation {
                debug!(path, "file load cancelled");
                st.buffer.abandon_load();
            }
        });
        let result = self.relay.read_file(&repo, path).await;
        cancel.disarm();

        let mut st = self.state();
        if st.load_generation != generation {
            debug!(path, "dropping superseded file load");
            return Err(WorkspaceError::Superseded);
        }
        match result {
            Ok(file) => {
                let session =
                    EditSession::opened(path.to_string(), file.text, file.version_token, generation);
                st.buffer = Buffer::Open {
                    session: session.clone(),
                    saving: false,
                };
                Ok(session)
            }
            Err(e) => {
                st.buffer = Buffer::NoFile;
                Err(e.into())
            }
        }
    }

    /// Replace the working text. Returns whether there are unsaved changes.
    pub fn edit(&self, new_text: impl Into<String>) -> Result<bool, WorkspaceError> {
        match &mut self.state().buffer {
            Buffer::Open { session, .. } => {
                session.set_working_text(new_text.into());
                Ok(session.has_unsaved_changes())
            }
            _ => Err(WorkspaceError::NoOpenFile),
        }
    }

    /// Save with the configured commit message.
    pub async fn save(&self) -> Result<SaveOutcome, WorkspaceError> {
        self.save_with_message(None).await
    }

    /// Write the working text back to the host.
    ///
    /// A clean buffer is a no-op. On success the saved text becomes the
    /// submitted text and the version token is replaced; on any failure the
    /// buffer is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `NoOpenFile` with no open buffer
    /// - `SaveInProgress` if a save is already in flight
    /// - `StaleVersion` if the file changed upstream
    /// - `SaveFailed` / `Unauthenticated` on other failures
    pub async fn save_with_message(
        &self,
        message: Option<&str>,
    ) -> Result<SaveOutcome, WorkspaceError> {
        let (repo, path, text, token, generation, message) = {
            let mut st = self.state();
            let repo = st.repo.clone().ok_or(WorkspaceError::NoRepository)?;
            let Buffer::Open { session, saving } = &mut st.buffer else {
                return Err(WorkspaceError::NoOpenFile);
            };
            if *saving {
                return Err(WorkspaceError::SaveInProgress);
            }
            if !session.has_unsaved_changes() {
                return Ok(SaveOutcome::NoChanges);
            }
            *saving = true;
            let path = session.file_path().to_string();
            let message = match message {
                Some(m) => m.to_string(),
                None => render_message(&self.commit_template, &path),
            };
            (
                repo,
                path,
                session.working_text().to_string(),
                session.version_token().to_string(),
                session.generation,
                message,
            )
        };

        let mut cancel = CancelGuard::new(|| {
            debug!(%path, "save cancelled");
            self.state().buffer.finish_save(generation);
        });
        let result = self
            .relay
            .write_file(&repo, &path, &text, &message, Some(&token))
            .await;
        cancel.disarm();

        let mut st = self.state();
        let current = st.buffer.finish_save(generation);

        match result {
            Ok(receipt) => {
                info!(%path, "saved");
                let still_dirty = match current {
                    Some(session) => {
                        session.mark_saved(text, receipt.version_token.clone());
                        session.has_unsaved_changes()
                    }
                    None => false,
                };
                st.cache.set_token(&path, &receipt.version_token);
                Ok(SaveOutcome::Saved {
                    version_token: receipt.version_token,
                    still_dirty,
                })
            }
            Err(RelayError::FetchFailed(msg)) => Err(WorkspaceError::SaveFailed(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new file at `path`.
    ///
    /// The node is added to its parent's listing when that listing is
    /// cached. The open buffer is not touched.
    pub async fn create_file(
        &self,
        path: &str,
        text: &str,
        message: Option<&str>,
    ) -> Result<TreeNode, WorkspaceError> {
        let (repo, epoch) = {
            let st = self.state();
            let repo = st.repo.clone().ok_or(WorkspaceError::NoRepository)?;
            (repo, st.epoch)
        };
        let message = match message {
            Some(m) => m.to_string(),
            None => render_message(DEFAULT_CREATE_MESSAGE, path),
        };

        let receipt = self
            .relay
            .write_file(&repo, path, text, &message, None)
            .await
            .map_err(|e| match e {
                RelayError::FetchFailed(msg) => WorkspaceError::SaveFailed(msg),
                other => other.into(),
            })?;

        let node = TreeNode {
            version_token: Some(receipt.version_token),
            size: Some(text.len() as u64),
            ..TreeNode::new(path, NodeKind::File)
        };
        let mut st = self.state();
        if st.epoch == epoch {
            st.cache.upsert(node.clone());
        }
        info!(%path, "created");
        Ok(node)
    }

    // ----------------------------------------------------------------------
    // Accessors
    // ----------------------------------------------------------------------

    pub fn repository(&self) -> Option<RepoRef> {
        self.state().repo.clone()
    }

    /// Cached children of `path`, without fetching.
    pub fn children(&self, path: &str) -> Option<Vec<TreeNode>> {
        self.state().cache.get(path).cloned()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.state().expanded.contains(path)
    }

    /// Whether a listing fetch for `path` is in flight.
    pub fn is_loading(&self, path: &str) -> bool {
        self.state().in_flight.contains_key(path)
    }

    /// The cached node at `path`, if its parent has been listed.
    pub fn node(&self, path: &str) -> Option<TreeNode> {
        self.state().cache.node(path).cloned()
    }

    /// A copy of the open edit session.
    pub fn session(&self) -> Option<EditSession> {
        match &self.state().buffer {
            Buffer::Open { session, .. } => Some(session.clone()),
            _ => None,
        }
    }

    pub fn edit_state(&self) -> EditState {
        match &self.state().buffer {
            Buffer::NoFile => EditState::NoFile,
            Buffer::Loading { path } => EditState::Loading { path: path.clone() },
            Buffer::Open { session, saving } => {
                let path = session.file_path().to_string();
                let dirty = session.has_unsaved_changes();
                if *saving {
                    EditState::Saving { path, dirty }
                } else {
                    EditState::Open { path, dirty }
                }
            }
        }
    }

    /// Rows the explorer shows: the root listing and, depth first, every
    /// expanded directory.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let st = self.state();
        let loading: HashSet<String> = st.in_flight.keys().cloned().collect();
        st.cache.rows(&st.expanded, &loading)
    }
}

/// Expand `{name}` and `{path}` in a commit message template.
fn render_message(template: &str, path: &str) -> String {
    template
        .replace("{name}", file_name(path))
        .replace("{path}", path)
}
