//! workspace::session
//!
//! The single-file edit buffer.

use serde::{Deserialize, Serialize};

use crate::core::language::language_for_path;

/// What happens to a dirty buffer when another file (or repository) is
/// opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscardPolicy {
    /// Drop unsaved changes silently.
    #[default]
    Discard,
    /// Refuse with `UnsavedChanges` until saved or explicitly discarded.
    Protect,
}

impl std::fmt::Display for DiscardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardPolicy::Discard => write!(f, "discard"),
            DiscardPolicy::Protect => write!(f, "protect"),
        }
    }
}

/// The open file: its saved text, working text, and version token.
///
/// `saved_text` is what the host holds at `version_token`; `working_text`
/// is what the user has typed. They differ exactly when there are unsaved
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    file_path: String,
    version_token: String,
    saved_text: String,
    working_text: String,
    /// Load generation this session was opened under.
    pub(crate) generation: u64,
}

impl EditSession {
    pub(crate) fn opened(
        file_path: String,
        text: String,
        version_token: String,
        generation: u64,
    ) -> Self {
        Self {
            file_path,
            version_token,
            saved_text: text.clone(),
            working_text: text,
            generation,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn version_token(&self) -> &str {
        &self.version_token
    }

    pub fn saved_text(&self) -> &str {
        &self.saved_text
    }

    pub fn working_text(&self) -> &str {
        &self.working_text
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.working_text != self.saved_text
    }

    /// Editor language id for the file, `plaintext` when unknown.
    pub fn language(&self) -> &'static str {
        language_for_path(&self.file_path)
    }

    pub(crate) fn set_working_text(&mut self, text: String) {
        self.working_text = text;
    }

    /// Record a successful write of `submitted` under `token`.
    ///
    /// Edits made while the write was in flight stay in `working_text`.
    pub(crate) fn mark_saved(&mut self, submitted: String, token: String) {
        self.saved_text = submitted;
        self.version_token = token;
    }
}

/// Observable state of the edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    NoFile,
    Loading { path: String },
    Open { path: String, dirty: bool },
    Saving { path: String, dirty: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditSession {
        EditSession::opened("src/index.ts".into(), "a".into(), "t1".into(), 1)
    }

    #[test]
    fn opens_clean() {
        let s = session();
        assert_eq!(s.saved_text(), s.working_text());
        assert!(!s.has_unsaved_changes());
        assert_eq!(s.language(), "typescript");
    }

    #[test]
    fn editing_back_to_saved_is_clean() {
        let mut s = session();
        s.set_working_text("b".into());
        assert!(s.has_unsaved_changes());
        s.set_working_text("a".into());
        assert!(!s.has_unsaved_changes());
    }

    #[test]
    fn mark_saved_keeps_later_edits() {
        let mut s = session();
        s.set_working_text("b".into());
        let submitted = s.working_text().to_string();
        s.set_working_text("bc".into());
        s.mark_saved(submitted, "t2".into());
        assert_eq!(s.version_token(), "t2");
        assert_eq!(s.saved_text(), "b");
        assert!(s.has_unsaved_changes());
    }

    #[test]
    fn discard_policy_serde() {
        #[derive(Deserialize)]
        struct Wrap {
            policy: DiscardPolicy,
        }
        let w: Wrap = toml::from_str("policy = \"protect\"").unwrap();
        assert_eq!(w.policy, DiscardPolicy::Protect);
        assert_eq!(DiscardPolicy::default(), DiscardPolicy::Discard);
    }
}
