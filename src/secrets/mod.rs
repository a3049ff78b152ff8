//! secrets
//!
//! Secret storage for the CLI's host token.
//!
//! # Architecture
//!
//! Secrets go through the [`SecretStore`] trait:
//!
//! - [`FileSecretStore`]: `~/.repodesk/secrets.toml` (default)
//! - [`MemorySecretStore`]: process-local, for tests
//!
//! The relay server never touches this module; its tokens live only in
//! server-side sessions.

mod file_store;
mod memory_store;
mod traits;

pub use file_store::{FileSecretStore, STATE_DIR};
pub use memory_store::MemorySecretStore;
pub use traits::{SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Create a secret store from the configured provider name.
///
/// # Errors
///
/// `ProviderNotAvailable` for an unknown provider, or the store's own
/// initialization error.
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new()?)),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file)",
            other
        ))),
    }
}
