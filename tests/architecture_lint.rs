//! Architecture enforcement tests.
//!
//! The workspace only sees the host through `ContentRelay`, the server
//! never drives a workspace, and commands build their relay in exactly
//! one place. These tests catch imports that cross those lines.
//!
//! # Test Categories
//!
//! 1. **Workspace Isolation** - no host, server, or CLI imports
//! 2. **Server Isolation** - no workspace or CLI imports
//! 3. **Relay Construction** - only `commands/mod.rs` builds a host client

use std::fs;
use std::path::{Path, PathBuf};

/// Every `.rs` file under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).expect("Failed to read source directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Source text up to the first `#[cfg(test)]`; tests may use anything.
fn non_test_source(path: &Path) -> String {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(idx) => content[..idx].to_string(),
        None => content,
    }
}

/// Lines in the files under `dir` that mention any of `forbidden`.
fn violations(dir: &str, forbidden: &[&str], skip: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for path in rust_files(Path::new(dir)) {
        let name = path.file_name().unwrap().to_str().unwrap();
        if skip.contains(&name) {
            continue;
        }
        for (lineno, line) in non_test_source(&path).lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            for pattern in forbidden {
                if line.contains(pattern) {
                    found.push(format!("{}:{}: {}", path.display(), lineno + 1, line.trim()));
                }
            }
        }
    }
    found
}

// =============================================================================
// Workspace Isolation
// =============================================================================

/// The workspace talks to `dyn ContentRelay` and nothing below it.
///
/// Swapping the in-process relay for `RelayClient` must never require a
/// workspace change.
#[test]
fn workspace_does_not_reach_past_relay() {
    let found = violations(
        "src/workspace",
        &["crate::host", "crate::server", "crate::cli", "reqwest::"],
        &[],
    );
    assert!(
        found.is_empty(),
        "workspace must only depend on relay and core:\n{}",
        found.join("\n")
    );
}

// =============================================================================
// Server Isolation
// =============================================================================

#[test]
fn server_does_not_use_workspace_or_cli() {
    let found = violations(
        "src/server",
        &["crate::workspace", "crate::cli"],
        &[],
    );
    assert!(
        found.is_empty(),
        "server handlers forward to the relay only:\n{}",
        found.join("\n")
    );
}

#[test]
fn library_layers_do_not_depend_on_cli() {
    for dir in ["src/auth", "src/host", "src/relay", "src/secrets", "src/core"] {
        let found = violations(dir, &["crate::cli", "crate::server"], &[]);
        assert!(found.is_empty(), "{}", found.join("\n"));
    }
}

// =============================================================================
// Relay Construction
// =============================================================================

/// Commands get their relay from `open_relay()` so `--relay` and token
/// resolution behave the same everywhere.
#[test]
fn commands_use_open_relay() {
    let found = violations(
        "src/cli/commands",
        &["GitHubHost", "HostRelay::new", "RelayClient::new"],
        &["mod.rs"],
    );
    assert!(
        found.is_empty(),
        "commands must build their relay through open_relay():\n{}",
        found.join("\n")
    );
}
