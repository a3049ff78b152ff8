//! host::github
//!
//! GitHub host implementation using the REST v3 API.
//!
//! # Design
//!
//! This module implements the `Host` trait for GitHub. A `GitHubHost` holds
//! exactly one bearer token: the relay builds one per request from the
//! session's token, and the CLI builds one from the stored token.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `HostError::RateLimited` on 429, or on 403 with
//!   `X-RateLimit-Remaining: 0`
//! - Returns `HostError::PermissionDenied` on any other 403
//! - Does not retry (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use repodesk::host::github::GitHubHost;
//! use repodesk::host::{Host, ListReposOpts};
//!
//! let host = GitHubHost::new("gho_xxx");
//! let repos = host.list_repositories(ListReposOpts::default()).await?;
//! ```

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    ContentEntry, Contents, EntryKind, FileEntry, Host, HostError, HostUser, ListReposOpts,
    PutContentsRequest, PutContentsResponse, Repository,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "repodesk";

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// GitHub host implementation.
pub struct GitHubHost {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token (OAuth or personal access token)
    token: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubHost")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubHost {
    /// Create a GitHub host against api.github.com.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a GitHub host with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (`https://github.example.com/api/v3`)
    /// or to point at a local mock server.
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), token, api_base)
    }

    /// Create a GitHub host sharing an existing HTTP client.
    ///
    /// The relay builds one host per request; sharing the client keeps the
    /// connection pool warm across requests.
    pub fn with_client(
        client: Client,
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client,
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, HostError> {
        if self.token.is_empty() {
            return Err(HostError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| HostError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build the contents URL for a path inside a repository.
    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents",
            self.api_base,
            encode_segment(owner),
            encode_segment(repo)
        );
        let encoded = encode_path(path);
        if !encoded.is_empty() {
            url.push('/');
            url.push_str(&encoded);
        }
        url
    }

    async fn send_get(&self, url: &str) -> Result<Response, HostError> {
        self.client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| HostError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, HostError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| HostError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Map an error response from the API to a `HostError`.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> HostError {
        let rate_limited = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => HostError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => HostError::RateLimited,
            StatusCode::FORBIDDEN => HostError::PermissionDenied(message),
            StatusCode::NOT_FOUND => HostError::NotFound(message),
            StatusCode::CONFLICT => HostError::Conflict(message),
            // Missing or malformed sha on an existing file is reported as 422.
            StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("sha") => {
                HostError::Conflict(message)
            }
            StatusCode::TOO_MANY_REQUESTS => HostError::RateLimited,
            _ if status.is_server_error() => HostError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => HostError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Host for GitHubHost {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn authenticated_user(&self) -> Result<HostUser, HostError> {
        let url = format!("{}/user", self.api_base);
        debug!(%url, "fetching authenticated user");
        let response = self.send_get(&url).await?;
        self.handle_response(response).await
    }

    async fn list_repositories(&self, opts: ListReposOpts) -> Result<Vec<Repository>, HostError> {
        let url = format!("{}/user/repos", self.api_base);
        debug!(page = opts.page, per_page = opts.per_page, "listing repositories");

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(&[
                ("sort", opts.sort.to_string()),
                ("per_page", opts.per_page.to_string()),
                ("page", opts.page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| HostError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Contents, HostError> {
        let url = self.contents_url(owner, repo, path);
        debug!(%owner, %repo, %path, "fetching contents");

        let response = self.send_get(&url).await?;
        let body: GitHubContents = self.handle_response(response).await?;

        match body {
            GitHubContents::Listing(entries) => Ok(Contents::Directory(entries)),
            GitHubContents::Single(item) if item.entry.kind == EntryKind::File => {
                if item.encoding.as_deref() == Some("none") {
                    return Err(HostError::ApiError {
                        status: 200,
                        message: format!("{} is too large for the contents API", item.entry.path),
                    });
                }
                Ok(Contents::File(FileEntry {
                    content_base64: item.content.unwrap_or_default(),
                    entry: item.entry,
                }))
            }
            // Symlinks and submodules come back as a single object; present
            // them as a one-entry listing.
            GitHubContents::Single(item) => Ok(Contents::Directory(vec![item.entry])),
        }
    }

    async fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: PutContentsRequest,
    ) -> Result<PutContentsResponse, HostError> {
        let url = self.contents_url(owner, repo, path);
        debug!(%owner, %repo, %path, create = request.sha.is_none(), "writing contents");

        let body = GitHubPutRequest {
            message: &request.message,
            content: &request.content_base64,
            sha: request.sha.as_deref(),
        };

        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| HostError::NetworkError(e.to_string()))?;

        let result: GitHubPutResponse = self.handle_response(response).await?;
        Ok(PutContentsResponse {
            content: result.content,
            commit_sha: result.commit.sha,
        })
    }
}

/// Percent-encode one path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Percent-encode an in-repo path, keeping `/` separators.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

// --------------------------------------------------------------------------
// GitHub API Types
// --------------------------------------------------------------------------

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Contents response: an array for directories, an object otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum GitHubContents {
    Listing(Vec<ContentEntry>),
    Single(GitHubContentItem),
}

#[derive(Deserialize)]
struct GitHubContentItem {
    #[serde(flatten)]
    entry: ContentEntry,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Serialize)]
struct GitHubPutRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct GitHubPutResponse {
    content: ContentEntry,
    commit: GitHubCommitRef,
}

#[derive(Deserialize)]
struct GitHubCommitRef {
    sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod urls {
        use super::*;

        #[test]
        fn root_contents_url_has_no_trailing_slash() {
            let host = GitHubHost::with_api_base("t", "https://api.example.com/");
            assert_eq!(
                host.contents_url("octo", "repo", ""),
                "https://api.example.com/repos/octo/repo/contents"
            );
        }

        #[test]
        fn nested_path_keeps_separators() {
            let host = GitHubHost::new("t");
            assert_eq!(
                host.contents_url("octo", "repo", "src/lib.rs"),
                "https://api.github.com/repos/octo/repo/contents/src/lib.rs"
            );
        }

        #[test]
        fn segments_are_escaped() {
            assert_eq!(encode_path("docs/my file#1.md"), "docs/my%20file%231.md");
            assert_eq!(encode_segment("a?b"), "a%3Fb");
        }
    }

    mod github_host {
        use super::*;

        #[test]
        fn name_is_github() {
            assert_eq!(GitHubHost::new("t").name(), "github");
        }

        #[test]
        fn debug_redacts_token() {
            let host = GitHubHost::new("gho_secret_token_value");
            let debug = format!("{:?}", host);
            assert!(!debug.contains("gho_secret_token_value"));
            assert!(debug.contains("has_token: true"));
        }

        #[test]
        fn empty_token_is_auth_required() {
            let host = GitHubHost::new("");
            assert!(matches!(host.headers(), Err(HostError::AuthRequired)));
        }

        #[test]
        fn headers_carry_bearer_and_version() {
            let host = GitHubHost::new("abc");
            let headers = host.headers().unwrap();
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
            assert_eq!(headers.get("X-GitHub-Api-Version").unwrap(), "2022-11-28");
        }
    }

    mod wire_types {
        use super::*;

        #[test]
        fn listing_parses_as_array() {
            let json = r#"[{"name":"a","path":"a","type":"file","sha":"1","size":3}]"#;
            let parsed: GitHubContents = serde_json::from_str(json).unwrap();
            assert!(matches!(parsed, GitHubContents::Listing(ref v) if v.len() == 1));
        }

        #[test]
        fn file_parses_as_single() {
            let json = r#"{"name":"a","path":"a","type":"file","sha":"1","size":3,
                           "content":"aGk=\n","encoding":"base64"}"#;
            let parsed: GitHubContents = serde_json::from_str(json).unwrap();
            match parsed {
                GitHubContents::Single(item) => {
                    assert_eq!(item.entry.kind, EntryKind::File);
                    assert_eq!(item.content.as_deref(), Some("aGk=\n"));
                }
                GitHubContents::Listing(_) => panic!("expected single item"),
            }
        }

        #[test]
        fn put_request_omits_missing_sha() {
            let body = GitHubPutRequest {
                message: "Create a",
                content: "aGk=",
                sha: None,
            };
            let json = serde_json::to_value(&body).unwrap();
            assert!(json.get("sha").is_none());
        }
    }
}
