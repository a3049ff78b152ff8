//! server::routes
//!
//! Route handlers. Auth routes live under `/auth`, content routes under
//! `/api/github`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::cookie;
use super::error::ApiError;
use super::AppState;
use crate::auth::UserProfile;
use crate::core::types::RepoRef;
use crate::host::Repository;
use crate::relay::{ContentRelay, HostRelay, PathContents, TreeNode, WriteReceipt};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    content: String,
    message: Option<String>,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    content: String,
    message: Option<String>,
}

/// A 302 to `location`, optionally setting a cookie.
fn found(location: &str, set_cookie: Option<String>) -> Response {
    let mut response = (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response();
    if let Some(value) = set_cookie.and_then(|v| v.parse().ok()) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

fn repo_ref(owner: &str, repo: &str) -> Result<RepoRef, ApiError> {
    RepoRef::new(owner, repo).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// The relay for the session on this request.
fn relay(state: &AppState, headers: &HeaderMap) -> Result<HostRelay, ApiError> {
    let sid = cookie::session_id(headers).ok_or(ApiError::Unauthenticated)?;
    let user = state
        .identity
        .current_user(&sid)
        .map_err(|_| ApiError::Unauthenticated)?;
    let host = state.connector.connect(user.access_token());
    Ok(HostRelay::new(host).with_repo_pages(state.repo_pages))
}

// ============================================================================
// /auth
// ============================================================================

pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    let redirect = state.identity.begin_login();
    found(&redirect.url, None)
}

pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let failure = format!("{}/login?error=auth_failed", state.client_url);
    let (Some(code), Some(login_state)) = (params.code, params.state) else {
        warn!("login callback without code or state");
        return found(&failure, None);
    };

    match state.identity.complete_login(&code, &login_state).await {
        Ok(sid) => {
            let dashboard = format!("{}/dashboard", state.client_url);
            found(&dashboard, Some(cookie::set_session(&sid, state.production)))
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            found(&failure, None)
        }
    }
}

pub async fn current_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let sid = cookie::session_id(&headers).ok_or(ApiError::Unauthenticated)?;
    let user = state
        .identity
        .current_user(&sid)
        .map_err(|_| ApiError::Unauthenticated)?;
    Ok(Json(user.profile()))
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(sid) = cookie::session_id(&headers) {
        if state.identity.logout(&sid) {
            info!("session ended");
        }
    }
    (
        [(SET_COOKIE, cookie::clear_session(state.production))],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

// ============================================================================
// /api/github
// ============================================================================

pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Repository>>, ApiError> {
    let relay = relay(&state, &headers)?;
    Ok(Json(relay.list_repositories().await?))
}

pub async fn list_directory(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Vec<TreeNode>>, ApiError> {
    let relay = relay(&state, &headers)?;
    let repo = repo_ref(&owner, &repo)?;
    Ok(Json(relay.list_directory(&repo, &params.path).await?))
}

pub async fn read_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((owner, repo, path)): Path<(String, String, String)>,
) -> Result<Json<PathContents>, ApiError> {
    let relay = relay(&state, &headers)?;
    let repo = repo_ref(&owner, &repo)?;
    Ok(Json(relay.read_path(&repo, &path).await?))
}

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<WriteReceipt>, ApiError> {
    let relay = relay(&state, &headers)?;
    let repo = repo_ref(&owner, &repo)?;
    let message = body
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Update {}", path));
    let receipt = relay
        .write_file(&repo, &path, &body.content, &message, body.sha.as_deref())
        .await?;
    info!(%repo, %path, "file updated");
    Ok(Json(receipt))
}

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(body): Json<CreateBody>,
) -> Result<Json<WriteReceipt>, ApiError> {
    let relay = relay(&state, &headers)?;
    let repo = repo_ref(&owner, &repo)?;
    let message = body
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Create {}", path));
    let receipt = relay
        .write_file(&repo, &path, &body.content, &message, None)
        .await?;
    info!(%repo, %path, "file created");
    Ok(Json(receipt))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}
