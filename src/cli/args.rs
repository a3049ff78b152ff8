//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the search path
//! - `--relay <url>`: Go through a running relay instead of the host API
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repodesk - browse and edit hosted repositories
#[derive(Parser, Debug)]
#[command(name = "repodesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Talk to a running relay at this URL (session id from $REPODESK_SESSION)
    #[arg(long, global = true, value_name = "URL")]
    pub relay: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; disables prompts
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether prompts are allowed: not `--quiet` and stdin is a terminal.
    pub fn interactive(&self) -> bool {
        use std::io::IsTerminal;
        !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the OAuth relay server
    #[command(
        name = "serve",
        long_about = "Run the relay HTTP server.\n\n\
            The relay runs the GitHub OAuth login for a browser client, keeps each \
            user's token in a server-side session, and forwards file operations to \
            the GitHub API. OAuth credentials come from the [oauth] config section \
            or GITHUB_CLIENT_ID / GITHUB_SECRET_KEY.",
        after_help = "\
EXAMPLES:
    # Development server on the default port (3000)
    repodesk serve

    # Another port
    repodesk serve --port 8080

    # Production cookies and client origin
    REPODESK_ENV=production repodesk serve"
    )]
    Serve {
        /// Port to listen on (overrides relay.port / $PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store or inspect a GitHub token
    #[command(
        name = "auth",
        long_about = "Store a GitHub token for the command-line client.\n\n\
            The token is kept in ~/.repodesk/secrets.toml with owner-only \
            permissions. GITHUB_TOKEN in the environment takes precedence over \
            the stored token.",
        after_help = "\
EXAMPLES:
    # Prompt for a token (input hidden)
    repodesk auth

    # Non-interactive
    repodesk auth --token ghp_xxxx

    # Where does the current token come from?
    repodesk auth --status

    # Remove the stored token
    repodesk auth --logout"
    )]
    Auth {
        /// Token to store (prompted for when omitted)
        #[arg(long, conflicts_with_all = ["status", "logout"])]
        token: Option<String>,

        /// Show current authentication status
        #[arg(long, conflicts_with = "logout")]
        status: bool,

        /// Remove stored authentication
        #[arg(long)]
        logout: bool,
    },

    /// List repositories, most recently updated first
    Repos,

    /// Print a repository's file tree
    #[command(
        name = "tree",
        after_help = "\
EXAMPLES:
    # Root only
    repodesk tree octocat/hello-world

    # Root plus two directories (parents are expanded as needed)
    repodesk tree octocat/hello-world --expand src --expand docs/api"
    )]
    Tree {
        /// Repository as owner/name
        repo: String,

        /// Directory to expand; repeatable
        #[arg(long = "expand", value_name = "DIR")]
        expand: Vec<String>,
    },

    /// Print a file's text
    Cat {
        /// Repository as owner/name
        repo: String,

        /// Path of the file inside the repository
        path: String,
    },

    /// Replace a file's text and commit it
    #[command(
        name = "put",
        long_about = "Replace the text of an existing file and commit it.\n\n\
            The file is loaded first and its version token is sent with the write, \
            so a file that changed upstream in between is refused instead of \
            overwritten. Identical text is not committed.",
        after_help = "\
EXAMPLES:
    # From a local file
    repodesk put octocat/hello-world README.md --from README.md

    # From stdin, with a message
    echo 'hi' | repodesk put octocat/hello-world notes.txt --from - -m 'Say hi'"
    )]
    Put {
        /// Repository as owner/name
        repo: String,

        /// Path of the file inside the repository
        path: String,

        /// Local file with the new text (`-` for stdin)
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Commit message (defaults to editor.commit_message)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Create a new file and commit it
    New {
        /// Repository as owner/name
        repo: String,

        /// Path of the new file inside the repository
        path: String,

        /// Local file with the text (`-` for stdin)
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Commit message (defaults to "Create <path>")
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    repodesk completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    repodesk completion zsh >> ~/.zshrc

    # Fish
    repodesk completion fish > ~/.config/fish/completions/repodesk.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
