//! core::language
//!
//! Editor language identifiers derived from file extensions.

/// Language id used when the extension is unknown.
pub const PLAIN_TEXT: &str = "plaintext";

/// Map a file name (or path) to the editor language id for highlighting.
///
/// Matching is on the final extension, case-insensitive.
///
/// ```
/// use repodesk::core::language::language_for_path;
///
/// assert_eq!(language_for_path("src/main.rs"), "rust");
/// assert_eq!(language_for_path("App.TSX"), "typescript");
/// assert_eq!(language_for_path("Makefile"), "plaintext");
/// ```
pub fn language_for_path(path: &str) -> &'static str {
    let name = crate::core::types::file_name(path);
    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return PLAIN_TEXT,
    };

    match ext.as_str() {
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "md" => "markdown",
        "yml" | "yaml" => "yaml",
        "xml" => "xml",
        "sql" => "sql",
        "sh" | "bash" => "shell",
        "php" => "php",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "go" => "go",
        "rb" => "ruby",
        "rs" => "rust",
        _ => PLAIN_TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(language_for_path("index.js"), "javascript");
        assert_eq!(language_for_path("a/b/c.py"), "python");
        assert_eq!(language_for_path("deploy.yml"), "yaml");
        assert_eq!(language_for_path("run.bash"), "shell");
    }

    #[test]
    fn uses_last_extension() {
        assert_eq!(language_for_path("archive.tar.go"), "go");
    }

    #[test]
    fn dotfiles_are_plain_text() {
        assert_eq!(language_for_path(".gitignore"), PLAIN_TEXT);
        assert_eq!(language_for_path("dir/.env"), PLAIN_TEXT);
    }

    #[test]
    fn extension_in_directory_is_ignored() {
        assert_eq!(language_for_path("v1.2/LICENSE"), PLAIN_TEXT);
    }
}
