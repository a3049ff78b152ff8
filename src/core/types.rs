//! core::types
//!
//! Strong types for repository addressing.
//!
//! # Types
//!
//! - [`RepoRef`] - Validated `owner/name` repository identity
//! - [`parent_path`] / [`file_name`] - splitting of in-repo paths
//!
//! # Validation
//!
//! `RepoRef` enforces validity at construction time so that a malformed
//! identity never reaches a URL builder. In-repo paths are deliberately
//! left as plain strings: cache keys are exact host paths and are never
//! normalized on our side.
//!
//! # Examples
//!
//! ```
//! use repodesk::core::types::RepoRef;
//!
//! let repo = RepoRef::parse("octocat/hello-world").unwrap();
//! assert_eq!(repo.owner(), "octocat");
//! assert_eq!(repo.name(), "hello-world");
//! assert_eq!(repo.to_string(), "octocat/hello-world");
//!
//! assert!(RepoRef::parse("no-slash").is_err());
//! assert!(RepoRef::parse("a/b/c").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository reference: {0}")]
    InvalidRepoRef(String),
}

/// A validated repository identity on the host.
///
/// Both parts must be non-empty and may not contain `/`, whitespace or
/// ASCII control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Create a repository reference from its two parts.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoRef` if either part is malformed.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let name = name.into();
        Self::validate_part("owner", &owner)?;
        Self::validate_part("name", &name)?;
        Ok(Self { owner, name })
    }

    /// Parse an `owner/name` string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let s = s.strip_suffix(".git").unwrap_or(s);
        match s.split_once('/') {
            Some((owner, name)) => Self::new(owner, name),
            None => Err(TypeError::InvalidRepoRef(format!(
                "'{}' is not of the form owner/name",
                s
            ))),
        }
    }

    fn validate_part(what: &str, part: &str) -> Result<(), TypeError> {
        if part.is_empty() {
            return Err(TypeError::InvalidRepoRef(format!("{} cannot be empty", what)));
        }
        if part.contains('/') {
            return Err(TypeError::InvalidRepoRef(format!(
                "{} cannot contain '/'",
                what
            )));
        }
        if part.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
            return Err(TypeError::InvalidRepoRef(format!(
                "{} cannot contain whitespace or control characters",
                what
            )));
        }
        Ok(())
    }

    /// The owning user or organization.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Path of the repository root.
pub const ROOT_PATH: &str = "";

/// Split an in-repo path into its parent directory path.
///
/// The root's children have the root (`""`) as parent.
///
/// ```
/// use repodesk::core::types::parent_path;
///
/// assert_eq!(parent_path("src/lib.rs"), "src");
/// assert_eq!(parent_path("README.md"), "");
/// assert_eq!(parent_path("a/b/c"), "a/b");
/// ```
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ROOT_PATH,
    }
}

/// Final component of an in-repo path.
///
/// ```
/// use repodesk::core::types::file_name;
///
/// assert_eq!(file_name("src/lib.rs"), "lib.rs");
/// assert_eq!(file_name("README.md"), "README.md");
/// ```
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}
