//! secrets::file_store
//!
//! File-based secret storage at `~/.repodesk/secrets.toml`.
//!
//! # Security
//!
//! - The file is created with mode 0600 on Unix before any secret is written
//! - Writes go to a sibling temp file which is then renamed over the target
//! - Values never appear in errors or logs
//!
//! # Format
//!
//! ```toml
//! [secrets]
//! "github.token" = "..."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// Directory under the home directory holding repodesk state.
pub const STATE_DIR: &str = ".repodesk";

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretsFile {
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

/// Secret store backed by a TOML file.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at `~/.repodesk/secrets.toml`.
    ///
    /// # Errors
    ///
    /// `ReadError` if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(STATE_DIR).join("secrets.toml")))
    }

    /// Store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SecretsFile, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SecretsFile::default())
            }
            Err(e) => {
                return Err(SecretError::ReadError(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e.kind()
                )))
            }
        };

        // The toml error may quote the offending line, so only its position
        // is reported.
        toml::from_str(&content).map_err(|e| {
            let at = e
                .span()
                .map(|span| format!(" at byte {}", span.start))
                .unwrap_or_default();
            SecretError::ReadError(format!("cannot parse {}{}", self.path.display(), at))
        })
    }

    fn store(&self, file: &SecretsFile) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(file)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize: {}", e)))?;

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut out = options
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // A pre-existing temp file keeps its old mode; tighten it.
            #[cfg(unix)]
            out.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            out.write_all(content.as_bytes())
                .and_then(|_| out.sync_all())
                .map_err(|e| SecretError::WriteError(format!("cannot write temp file: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot replace secrets file: {}", e)))
    }

    /// Whether the file is absent or readable by its owner only.
    #[cfg(unix)]
    pub fn has_private_permissions(&self) -> Result<bool, SecretError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.permissions().mode() & 0o077 == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(SecretError::ReadError(format!("cannot stat secrets file: {}", e))),
        }
    }

    #[cfg(not(unix))]
    pub fn has_private_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.secrets.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut file = self.load()?;
        file.secrets.insert(key.to_string(), value.to_string());
        self.store(&file)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut file = self.load()?;
        if file.secrets.remove(key).is_none() {
            return Ok(());
        }
        self.store(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        (temp, store)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_temp, store) = store();
        assert_eq!(store.get("github.token").expect("get"), None);
    }

    #[test]
    fn set_get_delete() {
        let (_temp, store) = store();
        store.set("github.token", "gho_one").expect("set");
        store.set("github.token", "gho_two").expect("overwrite");
        assert_eq!(
            store.get("github.token").expect("get"),
            Some("gho_two".to_string())
        );

        store.delete("github.token").expect("delete");
        assert!(!store.exists("github.token").expect("exists"));
    }

    #[test]
    fn delete_missing_does_not_create_file() {
        let (_temp, store) = store();
        store.delete("nothing").expect("delete");
        assert!(!store.path().exists());
    }

    #[test]
    fn creates_parent_directory() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join(STATE_DIR).join("secrets.toml");
        let store = FileSecretStore::with_path(&path);
        store.set("k", "v").expect("set");
        assert!(path.exists());
    }

    #[test]
    fn file_uses_secrets_table() {
        let (_temp, store) = store();
        store.set("github.token", "x").expect("set");
        let raw = fs::read_to_string(store.path()).expect("read");
        assert!(raw.contains("[secrets]"));
        assert!(raw.contains("\"github.token\""));
    }

    #[test]
    fn persists_across_instances() {
        let (temp, store) = store();
        store.set("k", "v").expect("set");
        let again = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        assert_eq!(again.get("k").expect("get"), Some("v".to_string()));
    }

    #[test]
    fn values_with_quotes_and_newlines() {
        let (_temp, store) = store();
        let tricky = "a \"quoted\"\nvalue = with equals";
        store.set("k", tricky).expect("set");
        assert_eq!(store.get("k").expect("get"), Some(tricky.to_string()));
    }

    #[test]
    fn parse_error_does_not_echo_contents() {
        let (_temp, store) = store();
        fs::write(store.path(), "[secrets]\n\"k\" = \"gho_leaky").expect("write");
        let msg = store.get("k").unwrap_err().to_string();
        assert!(msg.contains("cannot parse"));
        assert!(!msg.contains("gho_leaky"));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        let (_temp, store) = store();
        assert!(store.has_private_permissions().expect("absent"));
        store.set("k", "v").expect("set");
        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(store.has_private_permissions().expect("present"));
    }
}
