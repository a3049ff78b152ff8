//! host
//!
//! Abstraction for the source-control host's REST API.
//!
//! # Architecture
//!
//! The `Host` trait defines the calls the relay needs: identity lookup,
//! repository listing, and reading/writing repository contents. Nothing
//! above this layer speaks HTTP to the host directly.
//!
//! - Host failures never corrupt editor state; they are returned to the caller
//! - Write preconditions (blob sha) are enforced by the host, not emulated
//!
//! # Modules
//!
//! - `traits`: Core `Host` trait and request/response types
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: In-memory implementation for deterministic testing
//! - [`codec`]: Base64 transport encoding for file bodies
//! - `connector`: Per-token host construction for multi-user callers

pub mod codec;
mod connector;
pub mod github;
pub mod mock;
mod traits;

pub use connector::{GitHubConnector, HostConnector};
pub use traits::*;
