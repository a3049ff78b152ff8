//! repodesk - browse, edit, and save files in hosted repositories
//!
//! repodesk has two halves. A relay server runs the GitHub OAuth web flow
//! for a browser client and forwards file operations with the user's token.
//! The editor core keeps a lazily expanded file tree and a single-file
//! edit buffer, and talks to the host only through the relay interface.
//!
//! # Architecture
//!
//! - [`workspace`] - Tree cache and edit buffer (the editor core)
//! - [`relay`] - The content relay interface, in-process and over HTTP
//! - [`host`] - Host API gateway (GitHub REST, plus an in-memory mock)
//! - [`auth`] - OAuth login, server-side sessions, CLI tokens
//! - [`server`] - The relay's HTTP routes
//! - [`secrets`] - Secret storage for the CLI token
//! - [`core`] - Shared types and configuration
//! - [`cli`] - Command-line interface
//! - [`logging`] - Tracing subscriber setup
//!
//! # Invariants
//!
//! 1. A save never overwrites a file that changed upstream; it fails as stale
//! 2. A failed save leaves the edit buffer exactly as it was
//! 3. Only the most recently requested file load can populate the buffer
//! 4. Host tokens never reach the browser, logs, or `Debug` output

pub mod auth;
pub mod cli;
pub mod core;
pub mod host;
pub mod logging;
pub mod relay;
pub mod secrets;
pub mod server;
pub mod workspace;
