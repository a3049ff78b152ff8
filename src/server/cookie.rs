//! server::cookie
//!
//! The `sid` session cookie.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use crate::auth::{SessionId, SESSION_TTL};
use crate::relay::SESSION_COOKIE;

/// The session id carried by a request, if any.
pub fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| SessionId::from_cookie(value))
        })
}

/// `Set-Cookie` value that stores `sid`.
pub fn set_session(sid: &SessionId, production: bool) -> String {
    format!(
        "{}={}; {}",
        SESSION_COOKIE,
        sid.as_str(),
        attributes(SESSION_TTL.as_secs(), production)
    )
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn clear_session(production: bool) -> String {
    format!("{}=; {}", SESSION_COOKIE, attributes(0, production))
}

fn attributes(max_age: u64, production: bool) -> String {
    // Cross-site in production: the client is served from another origin.
    let site = if production {
        "Secure; SameSite=None"
    } else {
        "SameSite=Lax"
    };
    format!("Path=/; Max-Age={}; HttpOnly; {}", max_age, site)
}
