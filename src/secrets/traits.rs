//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! Keys are dotted names (e.g. `github.token`). Implementations never
//! log secret values or put them in error messages, and must be
//! `Send + Sync`.

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages name the key or the failing step, never the value.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secrets: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secrets: {0}")]
    WriteError(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Key-value storage for credentials.
///
/// # Example
///
/// ```
/// use repodesk::secrets::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::new();
/// store.set("github.token", "gho_example").unwrap();
/// assert!(store.exists("github.token").unwrap());
/// store.delete("github.token").unwrap();
/// assert_eq!(store.get("github.token").unwrap(), None);
/// ```
pub trait SecretStore: Send + Sync {
    /// Get a secret; `Ok(None)` if it is not set.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Whether a secret is set.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SecretError::ReadError("disk full".into());
        assert_eq!(err.to_string(), "failed to read secrets: disk full");

        let err = SecretError::WriteError("read-only filesystem".into());
        assert!(err.to_string().contains("write"));

        let err = SecretError::ProviderNotAvailable("vault".into());
        assert!(err.to_string().contains("vault"));
    }
}
