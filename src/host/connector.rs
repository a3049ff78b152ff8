//! host::connector
//!
//! Builds a [`Host`] bound to one user's token.
//!
//! The relay server serves many users, so it cannot hold a single
//! `Host`. Instead it keeps a connector and asks for a host per request,
//! using the token stored in that request's session.

use std::sync::Arc;

use reqwest::Client;

use super::github::{GitHubHost, DEFAULT_API_BASE};
use super::mock::MockHost;
use super::traits::Host;

/// Factory for token-bound hosts.
pub trait HostConnector: Send + Sync {
    /// A host acting with `token`.
    fn connect(&self, token: &str) -> Arc<dyn Host>;
}

/// Connects to the GitHub REST API, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    client: Client,
    api_base: String,
}

impl Default for GitHubConnector {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl GitHubConnector {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
        }
    }
}

impl HostConnector for GitHubConnector {
    fn connect(&self, token: &str) -> Arc<dyn Host> {
        Arc::new(GitHubHost::with_client(
            self.client.clone(),
            token,
            self.api_base.clone(),
        ))
    }
}

/// Every token sees the same in-memory store.
impl HostConnector for MockHost {
    fn connect(&self, _token: &str) -> Arc<dyn Host> {
        Arc::new(self.clone())
    }
}
