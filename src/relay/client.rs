//! relay::client
//!
//! HTTP client for a running relay server.
//!
//! # Design
//!
//! `RelayClient` is what a browser's service layer does, in Rust: every
//! call carries the `sid` session cookie, and the relay holds the host
//! token. Status codes map back onto [`RelayError`]:
//!
//! - 401 is `Unauthenticated`
//! - 409 on a write is `StaleVersion`
//! - anything else is `FetchFailed` (reads) or `SaveFailed` (writes)
//!
//! # Example
//!
//! ```ignore
//! use repodesk::relay::{ContentRelay, RelayClient};
//!
//! let client = RelayClient::new("http://localhost:3000").with_session("sid-from-login");
//! let me = client.current_user().await?;
//! let repos = client.list_repositories().await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentRelay, FileText, RelayError, TreeNode, WriteReceipt};
use crate::auth::UserProfile;
use crate::core::types::RepoRef;
use crate::host::github::{encode_path, encode_segment};
use crate::host::Repository;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Relay error body, `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    content: &'a str,
    message: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    content: &'a str,
    message: &'a str,
}

/// Which way a request goes, for error mapping.
#[derive(Clone, Copy)]
enum Direction {
    Read,
    Write,
}

/// Listings may arrive as an array or, from older relays, a single object.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<TreeNode>),
    One(Box<TreeNode>),
}

/// Content relay over HTTP.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
    session: Option<String>,
}

// Custom Debug to avoid exposing the session id
impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("base_url", &self.base_url)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl RelayClient {
    /// Client for the relay at `base_url`, with no session yet.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach a session id (the `sid` cookie value).
    pub fn with_session(mut self, sid: impl Into<String>) -> Self {
        self.session = Some(sid.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where to send a browser to start login.
    pub fn login_url(&self) -> String {
        format!("{}/auth/github", self.base_url)
    }

    fn contents_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/api/github/repos/{}/{}/contents",
            self.base_url,
            encode_segment(repo.owner()),
            encode_segment(repo.name())
        )
    }

    fn file_url(&self, repo: &RepoRef, path: &str) -> String {
        format!("{}/{}", self.contents_url(repo), encode_path(path))
    }

    fn with_cookie(&self, request: RequestBuilder) -> RequestBuilder {
        match self
            .session
            .as_deref()
            .and_then(|sid| HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, sid)).ok())
        {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        direction: Direction,
    ) -> Result<T, RelayError> {
        let failed = |msg: String| match direction {
            Direction::Read => RelayError::FetchFailed(msg),
            Direction::Write => RelayError::SaveFailed(msg),
        };

        let response = self
            .with_cookie(request)
            .send()
            .await
            .map_err(|e| failed(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| failed(format!("invalid response: {}", e)));
        }
        Err(error_from_response(response, status, direction).await)
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if the session is missing or expired.
    pub async fn current_user(&self) -> Result<UserProfile, RelayError> {
        let url = format!("{}/auth/user", self.base_url);
        self.send(self.client.get(url), Direction::Read).await
    }

    /// End the session on the relay.
    pub async fn logout(&self) -> Result<(), RelayError> {
        let url = format!("{}/auth/logout", self.base_url);
        let _: serde_json::Value = self.send(self.client.post(url), Direction::Write).await?;
        Ok(())
    }
}

async fn error_from_response(
    response: Response,
    status: StatusCode,
    direction: Direction,
) -> RelayError {
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    debug!(status = status.as_u16(), %message, "relay request failed");

    match (status, direction) {
        (StatusCode::UNAUTHORIZED, _) => RelayError::Unauthenticated,
        (StatusCode::CONFLICT, Direction::Write) => RelayError::StaleVersion(message),
        (_, Direction::Read) => RelayError::FetchFailed(format!("{}: {}", status, message)),
        (_, Direction::Write) => RelayError::SaveFailed(format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl ContentRelay for RelayClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>, RelayError> {
        let url = format!("{}/api/github/repos", self.base_url);
        self.send(self.client.get(url), Direction::Read).await
    }

    async fn list_directory(
        &self,
        repo: &RepoRef,
        path: &str,
    ) -> Result<Vec<TreeNode>, RelayError> {
        let request = self
            .client
            .get(self.contents_url(repo))
            .query(&[("path", path)]);
        let listing: OneOrMany = self.send(request, Direction::Read).await?;
        Ok(match listing {
            OneOrMany::Many(nodes) => nodes,
            OneOrMany::One(node) => vec![*node],
        })
    }

    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<FileText, RelayError> {
        let request = self.client.get(self.file_url(repo, path));
        self.send(request, Direction::Read).await
    }

    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        text: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<WriteReceipt, RelayError> {
        let url = self.file_url(repo, path);
        let request = match version_token {
            Some(sha) => self.client.put(url).json(&UpdateBody {
                content: text,
                message,
                sha,
            }),
            None => self.client.post(url).json(&CreateBody {
                content: text,
                message,
            }),
        };
        self.send(request, Direction::Write).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::NodeKind;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepoRef {
        RepoRef::new("octo", "demo").unwrap()
    }

    fn client(server: &MockServer) -> RelayClient {
        RelayClient::new(server.uri()).with_session("sid-1")
    }

    #[tokio::test]
    async fn sends_session_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/user"))
            .and(header("cookie", "sid=sid-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1", "username": "octocat", "displayName": "The Octocat"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let me = client(&server).current_user().await.unwrap();
        assert_eq!(me.username, "octocat");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/github/repos"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "Not authenticated"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).list_repositories().await.unwrap_err();
        assert_eq!(err, RelayError::Unauthenticated);
    }

    #[tokio::test]
    async fn listing_passes_path_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/github/repos/octo/demo/contents"))
            .and(query_param("path", "src"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "index.ts", "path": "src/index.ts", "type": "file", "sha": "a1"}
            ])))
            .mount(&server)
            .await;

        let nodes = client(&server)
            .list_directory(&repo(), "src")
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::File);
    }

    #[tokio::test]
    async fn single_object_listing_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/github/repos/octo/demo/contents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"name": "README.md", "path": "README.md", "type": "file", "sha": "r1"}
            )))
            .mount(&server)
            .await;

        let nodes = client(&server)
            .list_directory(&repo(), "README.md")
            .await
            .unwrap();
        assert_eq!(nodes[0].path, "README.md");
    }

    #[tokio::test]
    async fn update_sends_sha_and_maps_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/github/repos/octo/demo/contents/src/index.ts"))
            .and(body_json(serde_json::json!({
                "content": "x", "message": "Update index.ts", "sha": "old"
            })))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(serde_json::json!({"error": "File changed upstream"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .write_file(&repo(), "src/index.ts", "x", "Update index.ts", Some("old"))
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::StaleVersion("File changed upstream".into()));
    }

    #[tokio::test]
    async fn create_uses_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/github/repos/octo/demo/contents/docs/new.md"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"sha": "n1"})))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client(&server)
            .write_file(&repo(), "docs/new.md", "hello", "Create docs/new.md", None)
            .await
            .unwrap();
        assert_eq!(receipt.version_token, "n1");
    }

    #[tokio::test]
    async fn server_error_on_read_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(&server)
            .read_file(&repo(), "README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::FetchFailed(_)));
    }

    #[test]
    fn login_url_and_debug() {
        let client = RelayClient::new("http://relay.test/").with_session("secret-sid");
        assert_eq!(client.login_url(), "http://relay.test/auth/github");
        assert!(!format!("{:?}", client).contains("secret-sid"));
    }
}
