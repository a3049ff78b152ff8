//! auth::user
//!
//! The signed-in user, with and without credentials.
//!
//! [`User`] holds the host access token and lives only server-side; it does
//! not implement `Serialize` and its `Debug` output redacts the token.
//! [`UserProfile`] is the token-free projection sent to clients.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::host::HostUser;

/// A signed-in user and the token used on their behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    access_token: String,
}

impl User {
    /// Build a user from the host's account record and the token that
    /// fetched it. The display name falls back to the login.
    pub fn from_host(account: HostUser, access_token: impl Into<String>) -> Self {
        Self {
            id: account.id.to_string(),
            display_name: account.name.unwrap_or_else(|| account.login.clone()),
            username: account.login,
            email: account.email,
            avatar: account.avatar_url,
            access_token: access_token.into(),
        }
    }

    /// The host access token. Never log or return this to a client.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Token-free view for clients.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("avatar", &self.avatar)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// What `/auth/user` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> HostUser {
        HostUser {
            id: 583231,
            login: "octocat".into(),
            name: None,
            email: Some("octocat@github.com".into()),
            avatar_url: Some("https://avatars.example/u/583231".into()),
        }
    }

    #[test]
    fn display_name_falls_back_to_login() {
        let user = User::from_host(account(), "gho_abc");
        assert_eq!(user.display_name, "octocat");
        assert_eq!(user.id, "583231");
    }

    #[test]
    fn debug_redacts_token() {
        let user = User::from_host(account(), "gho_very_secret");
        let debug = format!("{:?}", user);
        assert!(!debug.contains("gho_very_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn profile_json_has_no_token() {
        let user = User::from_host(account(), "gho_very_secret");
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("gho_very_secret"));
        assert!(json.contains(r#""displayName":"octocat""#));
        assert!(json.contains(r#""avatar":"https://avatars.example/u/583231""#));
    }
}
