//! server
//!
//! The relay HTTP server: GitHub OAuth login plus authenticated content
//! routes, for a browser client on another origin.
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /auth/github` | 302 to the authorize URL |
//! | `GET /auth/github/callback` | set `sid`, 302 to `{client}/dashboard` |
//! | `GET /auth/user` | the signed-in [`UserProfile`](crate::auth::UserProfile) |
//! | `POST /auth/logout` | end the session |
//! | `GET /api/github/repos` | repositories |
//! | `GET /api/github/repos/:owner/:repo/contents?path=` | directory listing |
//! | `GET /api/github/repos/:owner/:repo/contents/*path` | file text, or the listing for a directory |
//! | `PUT /api/github/repos/:owner/:repo/contents/*path` | update a file |
//! | `POST /api/github/repos/:owner/:repo/contents/*path` | create a file |
//! | `GET /api/health` | liveness |
//!
//! # Sessions
//!
//! Host tokens stay on the server. The browser holds only the opaque `sid`
//! cookie; each content request resolves it to the stored user and builds
//! a [`HostRelay`](crate::relay::HostRelay) for that user's token.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use repodesk::core::config::Config;
//! use repodesk::server::{self, AppState};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?.config;
//! let state = Arc::new(AppState::from_config(&config)?);
//! server::serve(state, config.port()).await?;
//! # Ok(())
//! # }
//! ```

mod cookie;
mod error;
mod routes;

pub use error::ApiError;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{AuthError, IdentityProvider, OAuthClient};
use crate::core::config::Config;
use crate::host::{GitHubConnector, HostConnector};

/// Shared state behind every route.
pub struct AppState {
    identity: IdentityProvider,
    connector: Arc<dyn HostConnector>,
    client_url: String,
    production: bool,
    repo_pages: u32,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("identity", &self.identity)
            .field("client_url", &self.client_url)
            .field("production", &self.production)
            .field("repo_pages", &self.repo_pages)
            .finish()
    }
}

impl AppState {
    /// State for a development server on `client_url`.
    pub fn new(
        identity: IdentityProvider,
        connector: Arc<dyn HostConnector>,
        client_url: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            connector,
            client_url: client_url.into().trim_end_matches('/').to_string(),
            production: false,
            repo_pages: 1,
        }
    }

    /// State wired to GitHub from configuration.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotConfigured`] if the OAuth client id or secret is unset.
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let connector: Arc<dyn HostConnector> = Arc::new(GitHubConnector::new(config.api_base()));
        let identity = IdentityProvider::new(OAuthClient::from_config(config)?, connector.clone());
        Ok(Self::new(identity, connector, config.client_url())
            .with_production(config.production())
            .with_repo_pages(config.repo_pages()))
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_repo_pages(mut self, pages: u32) -> Self {
        self.repo_pages = pages.max(1);
        self
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn client_url(&self) -> &str {
        &self.client_url
    }
}

/// CORS for exactly the client origin, with credentials.
fn cors(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(client_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(%client_url, "client URL is not a valid origin; cross-origin requests will fail");
            layer
        }
    }
}

/// The relay's router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors(&state.client_url);

    let auth = Router::new()
        .route("/github", get(routes::login))
        .route("/github/callback", get(routes::callback))
        .route("/user", get(routes::current_user))
        .route("/logout", post(routes::logout));

    let github = Router::new()
        .route("/repos", get(routes::list_repositories))
        .route("/repos/:owner/:repo/contents", get(routes::list_directory))
        .route(
            "/repos/:owner/:repo/contents/*path",
            get(routes::read_file)
                .put(routes::update_file)
                .post(routes::create_file),
        );

    Router::new()
        .nest("/auth", auth)
        .nest("/api/github", github)
        .route("/api/health", get(routes::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay on `0.0.0.0:port` until the process exits.
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, client = %state.client_url, production = state.production, "relay listening");
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use crate::host::mock::MockHost;
    use crate::host::HostUser;
    use axum::body::Body;
    use axum::http::header::{COOKIE, LOCATION, ORIGIN, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state(host: &MockHost) -> Arc<AppState> {
        let oauth = OAuthClient::new("client-1", "secret-1", "http://localhost:3000/auth/github/callback")
            .with_oauth_base("http://127.0.0.1:9");
        let connector: Arc<dyn HostConnector> = Arc::new(host.clone());
        Arc::new(AppState::new(
            IdentityProvider::new(oauth, connector.clone()),
            connector,
            "http://localhost:5173",
        ))
    }

    fn signed_in(state: &AppState) -> String {
        let user = User::from_host(
            HostUser {
                id: 1,
                login: "octocat".into(),
                name: None,
                email: None,
                avatar_url: None,
            },
            "gho_test",
        );
        let sid = state.identity.sessions().create(user);
        format!("sid={}", sid.as_str())
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json(response).await,
            serde_json::json!({"status": "OK", "message": "Server is running"})
        );
    }

    #[tokio::test]
    async fn login_redirects_to_authorize() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(Request::get("/auth/github").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://127.0.0.1:9/login/oauth/authorize?client_id=client-1"));
    }

    #[tokio::test]
    async fn callback_with_bad_state_goes_to_login_error() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(
                Request::get("/auth/github/callback?code=abc&state=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "http://localhost:5173/login?error=auth_failed"
        );
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn user_requires_session() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(Request::get("/auth/user").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json(response).await,
            serde_json::json!({"error": "Not authenticated"})
        );
    }

    #[tokio::test]
    async fn user_profile_has_no_token() {
        let state = state(&MockHost::new());
        let cookie = signed_in(&state);
        let response = router(state)
            .oneshot(
                Request::get("/auth/user")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["username"], "octocat");
        assert!(!body.to_string().contains("gho_test"));
    }

    #[tokio::test]
    async fn logout_ends_session_and_clears_cookie() {
        let state = state(&MockHost::new());
        let cookie = signed_in(&state);
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::post("/auth/logout")
                    .header(COOKIE, cookie.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        assert!(state.identity.sessions().is_empty());

        let response = app
            .oneshot(
                Request::get("/auth/user")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn contents_without_cookie_is_401() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(
                Request::get("/api/github/repos/octo/demo/contents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_and_file_text() {
        let host = MockHost::new().with_file("octo", "demo", "src/main.rs", "fn main() {}\n");
        let state = state(&host);
        let cookie = signed_in(&state);
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/github/repos/octo/demo/contents?path=src")
                    .header(COOKIE, cookie.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = json(response).await;
        assert_eq!(listing[0]["path"], "src/main.rs");
        assert_eq!(listing[0]["type"], "file");

        let response = app
            .oneshot(
                Request::get("/api/github/repos/octo/demo/contents/src/main.rs")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let file = json(response).await;
        assert_eq!(file["decodedContent"], "fn main() {}\n");
        assert!(file["sha"].is_string());
    }

    #[tokio::test]
    async fn file_route_on_directory_returns_listing() {
        let host = MockHost::new().with_file("octo", "demo", "src/main.rs", "fn main() {}\n");
        let state = state(&host);
        let cookie = signed_in(&state);

        let response = router(state)
            .oneshot(
                Request::get("/api/github/repos/octo/demo/contents/src")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = json(response).await;
        assert_eq!(listing[0]["path"], "src/main.rs");
        assert!(listing[0].get("decodedContent").is_none());
    }

    #[tokio::test]
    async fn stale_update_is_409() {
        let host = MockHost::new().with_file("octo", "demo", "a.txt", "one");
        let state = state(&host);
        let cookie = signed_in(&state);

        let response = router(state)
            .oneshot(
                Request::put("/api/github/repos/octo/demo/contents/a.txt")
                    .header(COOKIE, cookie)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"two","sha":"not-the-sha"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(host.file_text("octo", "demo", "a.txt").unwrap(), "one");
    }

    #[tokio::test]
    async fn create_defaults_message() {
        let host = MockHost::new().with_repository("octo", "demo");
        let state = state(&host);
        let cookie = signed_in(&state);

        let response = router(state)
            .oneshot(
                Request::post("/api/github/repos/octo/demo/contents/docs/new.md")
                    .header(COOKIE, cookie)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"content":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json(response).await["sha"].is_string());
        assert!(host.operations().iter().any(|op| matches!(
            op,
            crate::host::mock::MockOperation::PutContents { message, .. }
                if message == "Create docs/new.md"
        )));
    }

    #[tokio::test]
    async fn cors_allows_only_client_origin() {
        let app = router(state(&MockHost::new()));
        let response = app
            .oneshot(
                Request::get("/api/health")
                    .header(ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }
}
