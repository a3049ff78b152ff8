//! core
//!
//! Core domain types and configuration for repodesk.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepoRef and in-repo path helpers
//! - [`language`] - Editor language ids from file extensions
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid repository identities at construction
//! - Schemas are strict (`deny_unknown_fields`) and validated after loading

pub mod config;
pub mod language;
pub mod types;
